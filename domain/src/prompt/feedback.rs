//! Texts injected into the conversation when supervisors reject a call

use crate::supervision::resolution::{ChainDecisions, feedback_decisions};
use crate::tool::entities::ToolCall;

/// User turn appended after every feedback note.
pub const RETRY_NUDGE: &str = "Please pay attention to the above feedback and try again.";

/// Templates for supervisor-authored messages
pub struct FeedbackTemplate;

impl FeedbackTemplate {
    /// Assistant note summarizing why `call` was rejected.
    ///
    /// Only REJECT, ESCALATE and TERMINATE decisions are listed.
    pub fn rejection(call: &ToolCall, chains: &[ChainDecisions]) -> String {
        let mut text = format!(
            "User tried to execute tool: {} with arguments: {}, but it was rejected by some supervisors. \n",
            call.tool_name,
            call.arguments_json()
        );
        for (chain, supervisor, decision) in feedback_decisions(chains) {
            text.push_str(&format!(
                "Chain {}: Supervisor {}: Decision: {}, Explanation: {} \n",
                chain,
                supervisor,
                decision.kind(),
                decision.explanation().unwrap_or("")
            ));
        }
        text.push_str("Please try again with the feedback!");
        text
    }

    /// Final assistant message once the call could not be rescued.
    ///
    /// `attempts` is the number of resamples that were tried; zero when
    /// resampling is disabled.
    pub fn exhausted(call: &ToolCall, attempts: u32, notes: &[String]) -> String {
        let mut text = format!(
            "The agent requested to execute a function {} with arguments {} but it was rejected.\n",
            call.tool_name,
            call.arguments_json()
        );
        if attempts > 0 {
            text.push_str(&format!(
                "We tried {} times to get a valid response but it was rejected each time.\n",
                attempts
            ));
        }
        text.push_str("Here is the feedback from the supervisor: \n");
        for (k, note) in notes.iter().enumerate() {
            if attempts > 0 {
                text.push_str(&format!("Resample {}: {}\n", k + 1, note));
            } else {
                text.push_str(note);
                text.push('\n');
            }
        }
        text.push_str(
            "This is not a message from the user but from a supervisor system that is helping the agent to improve its behavior. You should try something else!",
        );
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervision::decision::SupervisionDecision;

    fn call() -> ToolCall {
        ToolCall::new("call_1", "delete_file").with_param("path", "/etc/passwd")
    }

    #[test]
    fn test_rejection_lists_only_feedback_kinds() {
        let chains = vec![
            ChainDecisions::new("a", vec![SupervisionDecision::approve()]),
            ChainDecisions::new(
                "b",
                vec![
                    SupervisionDecision::escalate("needs a human"),
                    SupervisionDecision::reject("system files are off limits"),
                ],
            ),
        ];
        let text = FeedbackTemplate::rejection(&call(), &chains);
        assert!(text.starts_with(
            "User tried to execute tool: delete_file with arguments: {\"path\":\"/etc/passwd\"}"
        ));
        assert!(text.contains("Chain 2: Supervisor 1: Decision: escalate, Explanation: needs a human"));
        assert!(text.contains(
            "Chain 2: Supervisor 2: Decision: reject, Explanation: system files are off limits"
        ));
        assert!(!text.contains("Chain 1"));
        assert!(text.ends_with("Please try again with the feedback!"));
    }

    #[test]
    fn test_exhausted_quotes_every_note() {
        let notes = vec!["first".to_string(), "second".to_string()];
        let text = FeedbackTemplate::exhausted(&call(), 2, &notes);
        assert!(text.contains("We tried 2 times"));
        assert!(text.contains("Resample 1: first"));
        assert!(text.contains("Resample 2: second"));
        assert!(text.contains("This is not a message from the user"));
    }

    #[test]
    fn test_exhausted_without_resampling() {
        let text = FeedbackTemplate::exhausted(&call(), 0, &["only".to_string()]);
        assert!(!text.contains("We tried"));
        assert!(!text.contains("Resample"));
        assert!(text.contains("only\n"));
    }
}
