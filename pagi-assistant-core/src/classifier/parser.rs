use crate::memory::MessageType;

/// Outcome of one classification, consumed immediately by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub tag: MessageType,
    pub payload: String,
}

const MARKERS: [MessageType; 4] = [
    MessageType::Skill,
    MessageType::Solution,
    MessageType::Problem,
    MessageType::Talk,
];

/// Characters stripped around a skill identifier.
const IDENT_TRIM: &[char] = &['`', '\'', '"', '[', ']', '(', ')', '<', '>', '.', ',', ';', ':', '!', '?'];

/// Extracts the tag and payload from raw oracle text.
///
/// The earliest marker in the text wins. Markers are case-sensitive. Text
/// without a usable marker degrades to `Talk` with the whole trimmed input.
pub fn extract(raw: &str) -> ClassificationResult {
    let found = MARKERS
        .iter()
        .filter_map(|tag| raw.find(tag.marker()).map(|pos| (pos, *tag)))
        .min_by_key(|(pos, _)| *pos);

    if let Some((pos, tag)) = found {
        let rest = &raw[pos + tag.marker().len()..];
        let payload = payload_for(tag, rest);
        if !payload.is_empty() {
            return ClassificationResult { tag, payload };
        }
    }

    ClassificationResult {
        tag: MessageType::Talk,
        payload: raw.trim().to_string(),
    }
}

fn payload_for(tag: MessageType, rest: &str) -> String {
    let line = rest.lines().next().unwrap_or("").trim();
    match tag {
        MessageType::Skill => line
            .split_whitespace()
            .next()
            .unwrap_or("")
            .trim_matches(IDENT_TRIM)
            .to_string(),
        MessageType::Talk | MessageType::Problem | MessageType::Solution => line.to_string(),
    }
}
