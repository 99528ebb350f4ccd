//! 指令提取
//!
//! 模型回复中的 `[COMMAND: <body>]` 按出现顺序提取（保留重复），其余文本作为叙述。
//! 未闭合或格式不对的标签原样留在叙述中。

use std::sync::OnceLock;

use regex::Regex;

static DIRECTIVE_RE: OnceLock<Regex> = OnceLock::new();

fn directive_re() -> &'static Regex {
    DIRECTIVE_RE.get_or_init(|| {
        Regex::new(r"\[COMMAND:\s*([^\[\]\s][^\[\]]*?)\s*\]").expect("directive pattern is valid")
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedReply {
    /// 去掉指令后的文本（已 trim）
    pub narrative: String,
    /// 指令体，按出现顺序
    pub directives: Vec<String>,
}

pub fn extract_directives(reply: &str) -> ParsedReply {
    let re = directive_re();
    let directives = re
        .captures_iter(reply)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect();
    let narrative = re.replace_all(reply, "").trim().to_string();
    ParsedReply {
        narrative,
        directives,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_in_order() {
        let parsed = extract_directives("Sure! [COMMAND: reset_view] Done. [COMMAND: switch_to_surface]");
        assert_eq!(parsed.directives, vec!["reset_view", "switch_to_surface"]);
        assert_eq!(parsed.narrative, "Sure!  Done.");
    }

    #[test]
    fn test_duplicates_kept_and_params_preserved() {
        let parsed =
            extract_directives("[COMMAND:reset_view][COMMAND: zoom_chain B ] [COMMAND: reset_view]");
        assert_eq!(parsed.directives, vec!["reset_view", "zoom_chain B", "reset_view"]);
        assert_eq!(parsed.narrative, "");
    }

    #[test]
    fn test_malformed_tags_stay_as_text() {
        let parsed = extract_directives("Try [COMMAND: reset_view and [command: hide_water]");
        assert!(parsed.directives.is_empty());
        assert_eq!(parsed.narrative, "Try [COMMAND: reset_view and [command: hide_water]");

        let parsed = extract_directives("Empty [COMMAND: ] tag");
        assert!(parsed.directives.is_empty());
    }

    #[test]
    fn test_plain_reply() {
        let parsed = extract_directives("  Proteins fold.  ");
        assert_eq!(parsed.narrative, "Proteins fold.");
        assert!(parsed.directives.is_empty());
    }
}
