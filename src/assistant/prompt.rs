//! 系统提示词：角色说明 + 命令目录 + 指令语法 + 当前查看器上下文

use crate::assistant::AssistantContext;
use crate::commands::CommandRegistry;

const ROLE: &str = "You are a molecular visualization assistant embedded in a 3D structure viewer. \
Answer questions about the loaded structure and structural biology concisely, and operate the viewer when the user asks for it.";

const DIRECTIVE_RULES: &str = "To operate the viewer, include one directive per action in your reply using exactly this syntax: \
[COMMAND: command_name] or, for chain commands, [COMMAND: command_name <chain>]. \
Directives are executed in the order they appear. Only use commands from the list. \
Do not describe the directive syntax to the user.";

pub fn build_system_prompt(registry: &CommandRegistry, context: &AssistantContext) -> String {
    let structure = match (&context.structure_name, context.has_structure_loaded) {
        (Some(name), true) => name.clone(),
        _ => "none".to_string(),
    };

    format!(
        "{ROLE}\n\n\
         Available commands:\n{}\n\n\
         {DIRECTIVE_RULES}\n\n\
         Current viewer state:\n\
         - Structure loaded: {}\n\
         - Structure name: {}\n\
         - Representation: {}",
        registry.catalog(),
        if context.has_structure_loaded { "yes" } else { "no" },
        structure,
        context.representation,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::builtin_registry;
    use crate::viewer::Representation;

    #[test]
    fn test_prompt_contains_catalog_and_context() {
        let context = AssistantContext {
            structure_name: Some("1crn".into()),
            representation: Representation::Surface,
            has_structure_loaded: true,
        };
        let prompt = build_system_prompt(&builtin_registry(), &context);
        assert!(prompt.contains("- zoom_chain <chain>: "));
        assert!(prompt.contains("- analyze_selection: "));
        assert!(prompt.contains("[COMMAND: command_name]"));
        assert!(prompt.contains("Structure name: 1crn"));
        assert!(prompt.contains("Representation: surface"));
    }

    #[test]
    fn test_prompt_without_structure() {
        let prompt = build_system_prompt(&builtin_registry(), &AssistantContext::default());
        assert!(prompt.contains("Structure loaded: no"));
        assert!(prompt.contains("Structure name: none"));
    }
}
