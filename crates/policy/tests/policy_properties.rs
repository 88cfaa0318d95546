use proptest::prelude::*;
use sysgate_policy::{PolicyDecision, PolicyGate, NONE_MATCHED};

const SAFE_HEADS: &[&str] = &["ps aux", "free -h", "df -h", "uname -a", "cat /proc/loadavg", "grep foo"];
const FRAGMENTS: &[&str] = &["rm ", "sudo", "kill ", "shutdown", "> ", "$(", "`", "chmod", "curl ", "mkfs"];

proptest! {
    #[test]
    fn deny_fragment_anywhere_is_denied(
        head in prop::sample::select(SAFE_HEADS),
        fragment in prop::sample::select(FRAGMENTS),
        upper in any::<bool>(),
        tail in "[a-z0-9 /.-]{0,12}",
    ) {
        let fragment = if upper { fragment.to_uppercase() } else { fragment.to_string() };
        let command = format!("{} {}{}", head, fragment, tail);
        let decision = PolicyGate::new().evaluate(&command);
        prop_assert!(!decision.is_allowed(), "{command} was allowed");
        prop_assert_ne!(decision.matched_pattern(), Some(NONE_MATCHED));
    }

    #[test]
    fn unlisted_program_is_denied(program in "[qxz][0-9]{2,6}", args in "[0-9 ]{0,10}") {
        let command = format!("{program} {args}");
        let decision = PolicyGate::new().evaluate(&command);
        prop_assert_eq!(
            decision,
            PolicyDecision::Denied { matched_pattern: NONE_MATCHED.to_string() }
        );
    }
}

#[test]
fn decision_serializes_with_tag() {
    let denied = PolicyGate::new().evaluate("reboot");
    let json = serde_json::to_value(&denied).unwrap();
    assert_eq!(json["decision"], "denied");
    assert_eq!(json["matched_pattern"], "reboot");

    let allowed = serde_json::to_value(PolicyDecision::Allowed).unwrap();
    assert_eq!(allowed["decision"], "allowed");
}
