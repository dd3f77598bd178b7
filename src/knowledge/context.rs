use super::Passage;

/// English text averages ~4 chars/token for subword tokenizers.
const CHARS_PER_TOKEN: usize = 4;

/// Retrieved passages packed into a prompt section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledPassages {
    pub text: String,
    pub passages_used: usize,
    pub estimated_tokens: usize,
}

/// Pack the highest-scoring passages into `max_chars`.
///
/// Passages are never split; one that does not fit is skipped so a shorter,
/// lower-ranked passage can still be included.
pub fn assemble_passages(passages: &[Passage], max_chars: usize) -> AssembledPassages {
    let mut ranked: Vec<&Passage> = passages
        .iter()
        .filter(|p| !p.content.trim().is_empty())
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut text = String::new();
    let mut passages_used = 0;
    for passage in ranked {
        let section = format_passage(passage);
        if text.len() + section.len() > max_chars {
            continue;
        }
        text.push_str(&section);
        passages_used += 1;
    }

    AssembledPassages {
        estimated_tokens: text.len() / CHARS_PER_TOKEN,
        text,
        passages_used,
    }
}

fn format_passage(passage: &Passage) -> String {
    match &passage.source {
        Some(source) => format!("[{}] {}\n", source, passage.content.trim()),
        None => format!("{}\n", passage.content.trim()),
    }
}
