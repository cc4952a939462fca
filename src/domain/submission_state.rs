//! 交易提交状态机
//!
//! Idle → Validating → Signing → Broadcasting → Confirming → {Confirmed | Failed}
//! 任何非终态都可以直接进入 Failed。

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Validating,
    Signing,
    Broadcasting,
    Confirming,
    Confirmed,
    Failed,
}

impl SubmissionState {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }

    /// 验证状态转换合法性
    pub fn can_transition_to(&self, target: &Self) -> bool {
        use SubmissionState::*;

        match (self, target) {
            _ if self.is_final() => false,
            (_, Failed) => true,
            (Idle, Validating)
            | (Validating, Signing)
            | (Signing, Broadcasting)
            | (Broadcasting, Confirming)
            | (Confirming, Confirmed) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Signing => "signing",
            Self::Broadcasting => "broadcasting",
            Self::Confirming => "confirming",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次提交的状态轨迹
#[derive(Debug, Clone)]
pub struct SubmissionTracker {
    current: SubmissionState,
    history: Vec<SubmissionState>,
}

impl Default for SubmissionTracker {
    fn default() -> Self {
        Self {
            current: SubmissionState::Idle,
            history: vec![SubmissionState::Idle],
        }
    }
}

impl SubmissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> SubmissionState {
        self.current
    }

    pub fn history(&self) -> &[SubmissionState] {
        &self.history
    }

    /// 非法转换返回错误，状态不变
    pub fn advance(&mut self, target: SubmissionState) -> anyhow::Result<()> {
        if !self.current.can_transition_to(&target) {
            anyhow::bail!(
                "illegal submission transition: {} -> {}",
                self.current,
                target
            );
        }
        tracing::debug!(from = %self.current, to = %target, "submission state changed");
        self.current = target;
        self.history.push(target);
        Ok(())
    }

    /// 进入 Failed；已是终态时忽略
    pub fn fail(&mut self) {
        if !self.current.is_final() {
            self.current = SubmissionState::Failed;
            self.history.push(SubmissionState::Failed);
        }
    }

    pub fn into_history(self) -> Vec<SubmissionState> {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::SubmissionState::*;
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut tracker = SubmissionTracker::new();
        for state in [Validating, Signing, Broadcasting, Confirming, Confirmed] {
            tracker.advance(state).unwrap();
        }
        assert_eq!(
            tracker.history(),
            &[Idle, Validating, Signing, Broadcasting, Confirming, Confirmed]
        );
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!Idle.can_transition_to(&Signing));
        assert!(!Validating.can_transition_to(&Broadcasting));
        assert!(!Confirmed.can_transition_to(&Failed));
        assert!(!Failed.can_transition_to(&Validating));

        let mut tracker = SubmissionTracker::new();
        assert!(tracker.advance(Confirmed).is_err());
        assert_eq!(tracker.current(), Idle);
    }

    #[test]
    fn test_any_non_final_state_can_fail() {
        for state in [Idle, Validating, Signing, Broadcasting, Confirming] {
            assert!(state.can_transition_to(&Failed), "{} -> failed", state);
        }
    }

    #[test]
    fn test_fail_is_idempotent_on_final() {
        let mut tracker = SubmissionTracker::new();
        tracker.advance(Validating).unwrap();
        tracker.fail();
        tracker.fail();
        assert_eq!(tracker.history(), &[Idle, Validating, Failed]);
    }
}
