// Shared prompt fragments. Each module that calls the model keeps its own
// prompts.rs alongside it; this file holds the cross-cutting pieces.

/// Appended to any request whose reply must be a single JSON object.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Sent after an invalid reply, together with that reply, on the repair round-trip.
pub const REPAIR_INSTRUCTION: &str = "Repair: your previous reply was not valid JSON for the \
    requested schema. Return only valid JSON matching the schema. No extra text.";

/// Non-diagnostic stance shared by every patient-facing prompt.
pub const NOT_A_DOCTOR: &str = "You are not a doctor. \
    Never claim certainty and never present a diagnosis; speak of possible explanations.";
