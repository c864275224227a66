pub const DECISIONS: &str = "balancer_policy_decisions_total";
pub const RECEIVER_SKIPPED: &str = "balancer_policy_receiver_skipped_total";
