use std::collections::BTreeMap;

use ledgerflow_providers::ChatTurn;
use ledgerflow_store::{KnnMatch, Message, MessageRole};

/// Directive prepended to every retrieval-augmented turn.
const SYSTEM_DIRECTIVE: &str =
    "Use only given data; do not guess numbers; separate company answers.";

/// Groups retrieved chunks by company and renders each with a bracketed
/// header identifying its document type, reporting period, and semantic
/// field. Company order is the chunk's own distance-ranked
/// order of first appearance — `BTreeMap` would alphabetize and lose that.
pub fn render_context(matches: &[KnnMatch]) -> String {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: BTreeMap<&str, Vec<&KnnMatch>> = BTreeMap::new();

    for m in matches {
        if !grouped.contains_key(m.company.as_str()) {
            order.push(m.company.as_str());
        }
        grouped.entry(m.company.as_str()).or_default().push(m);
    }

    let mut out = String::new();
    for company in order {
        out.push_str(&format!("## {company}\n\n"));
        for chunk in &grouped[company] {
            let field = chunk.field_tag.as_deref().unwrap_or("general");
            out.push_str(&format!(
                "[Document: {}, Period: {}, Field: {}]\n{}\n\n",
                chunk.doc_type, chunk.period, field, chunk.content
            ));
        }
    }
    out
}

/// Assembles the full turn sequence the chat provider streams against:
/// the system directive, then chat history in chronological order, then
/// the retrieval-augmented user turn.
pub fn build_turns(history: &[Message], user_content: &str, context: &str) -> Vec<ChatTurn> {
    let mut turns = Vec::with_capacity(history.len() + 2);

    turns.push(ChatTurn {
        role: "system",
        content: SYSTEM_DIRECTIVE.to_string(),
    });

    for message in history {
        turns.push(ChatTurn {
            role: role_str(message.role),
            content: message.content.clone(),
        });
    }

    turns.push(ChatTurn {
        role: "user",
        content: format!("{context}\nQuestion: {user_content}"),
    });

    turns
}

fn role_str(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Ai => "assistant",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerflow_core::Id;

    fn m(company: &str, content: &str) -> KnnMatch {
        KnnMatch {
            chunk_id: Id::new(),
            content: content.to_string(),
            page_no: 1,
            doc_type: "10-K".to_string(),
            period: "FY2025".to_string(),
            company: company.to_string(),
            field_tag: Some("revenue".to_string()),
            distance: 0.1,
        }
    }

    #[test]
    fn groups_by_company_in_order_of_first_appearance() {
        let matches = vec![m("Acme", "a1"), m("Beta", "b1"), m("Acme", "a2")];
        let rendered = render_context(&matches);
        let acme_pos = rendered.find("## Acme").unwrap();
        let beta_pos = rendered.find("## Beta").unwrap();
        assert!(acme_pos < beta_pos);
        assert!(rendered.contains("[Document: 10-K, Period: FY2025, Field: revenue]"));
    }

    #[test]
    fn empty_matches_yields_empty_context() {
        assert!(render_context(&[]).is_empty());
    }
}
