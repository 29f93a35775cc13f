use relay_llm::Message;

/// Instruction asking the model to emit `思考：` then `回答：` sections
pub const REASONING_SYSTEM_PROMPT: &str = "请先进行思考，分析问题并给出推理过程，然后再给出最终答案。格式为：\n\n思考：[你的分析和推理过程]\n\n回答：[你的最终答案]";

/// Install the reasoning instruction: every system message gets it as its
/// content, or one is prepended when the conversation has none.
pub fn inject_reasoning_prompt(mut messages: Vec<Message>) -> Vec<Message> {
    let mut replaced = false;
    for message in messages.iter_mut().filter(|m| m.is_system()) {
        message.content = REASONING_SYSTEM_PROMPT.to_string();
        replaced = true;
    }

    if !replaced {
        messages.insert(0, Message::system(REASONING_SYSTEM_PROMPT));
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_llm::Role;

    #[test]
    fn test_prepends_when_absent() {
        let messages = inject_reasoning_prompt(vec![Message::user("hi")]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, REASONING_SYSTEM_PROMPT);
        assert_eq!(messages[1], Message::user("hi"));
    }

    #[test]
    fn test_replaces_every_system_message_in_place() {
        let messages = inject_reasoning_prompt(vec![
            Message::system("be terse"),
            Message::user("hi"),
            Message::assistant("hello"),
            Message::system("another"),
        ]);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].content, REASONING_SYSTEM_PROMPT);
        assert_eq!(messages[3].content, REASONING_SYSTEM_PROMPT);
        assert_eq!(messages[2], Message::assistant("hello"));
    }

    #[test]
    fn test_empty_conversation_gets_instruction() {
        let messages = inject_reasoning_prompt(Vec::new());
        assert_eq!(messages, vec![Message::system(REASONING_SYSTEM_PROMPT)]);
    }
}
