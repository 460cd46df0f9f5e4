use std::fmt;
use std::time::Duration;

use log::{debug, info};

use crate::{app::Command, config::Chrome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Yes,
    No,
}

impl Choice {
    pub const ALL: [Choice; 2] = [Choice::Yes, Choice::No];

    pub fn label(self) -> &'static str {
        match self {
            Choice::Yes => "Yes",
            Choice::No => "No",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unattached,
    Attached,
    Terminating,
    Terminated,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverFlags {
    pub yes: bool,
    pub no: bool,
}

impl HoverFlags {
    pub fn get(&self, choice: Choice) -> bool {
        match choice {
            Choice::Yes => self.yes,
            Choice::No => self.no,
        }
    }

    fn slot(&mut self, choice: Choice) -> &mut bool {
        match choice {
            Choice::Yes => &mut self.yes,
            Choice::No => &mut self.no,
        }
    }
}

pub struct AppState {
    pub phase: Phase,
    pub customized: bool,
    pub hover: HoverFlags,
    pub question_index: usize,
    question_count: usize,
    rotate_interval: Option<Duration>,
    exit_delay: Duration,
    chrome: Chrome,
}

impl AppState {
    pub fn new(
        chrome: Chrome,
        exit_delay: Duration,
        question_count: usize,
        rotate_interval: Option<Duration>,
    ) -> Self {
        Self {
            phase: Phase::Unattached,
            customized: false,
            hover: HoverFlags::default(),
            question_index: 0,
            question_count: question_count.max(1),
            rotate_interval,
            exit_delay,
            chrome,
        }
    }

    pub fn rotate_interval(&self) -> Option<Duration> {
        self.rotate_interval
    }

    pub fn is_closing(&self) -> bool {
        matches!(self.phase, Phase::Terminating | Phase::Terminated)
    }

    pub fn update(&mut self, message: Message) -> Command {
        match message {
            Message::WindowAttached => {
                if self.customized {
                    debug!("window attached again, chrome already applied");
                    return Command::None;
                }
                self.customized = true;
                if self.phase == Phase::Unattached {
                    self.phase = Phase::Attached;
                }
                info!("window attached, customizing chrome");
                Command::CustomizeWindow(self.chrome.clone())
            }
            Message::Hover { choice, hovering } => {
                if self.hover.get(choice) == hovering {
                    return Command::None;
                }
                *self.hover.slot(choice) = hovering;
                Command::RestyleButton {
                    choice,
                    hovered: hovering,
                }
            }
            Message::Answered(choice) => {
                if self.is_closing() {
                    debug!("{choice} pressed while closing, ignored");
                    return Command::None;
                }
                // The answer itself is not acted upon.
                info!("answered {choice}");
                if self.exit_delay.is_zero() {
                    self.phase = Phase::Terminated;
                    Command::Exit
                } else {
                    self.phase = Phase::Terminating;
                    Command::ScheduleExit(self.exit_delay)
                }
            }
            Message::ExitDelayElapsed => {
                if self.phase != Phase::Terminating {
                    return Command::None;
                }
                self.phase = Phase::Terminated;
                Command::Exit
            }
            Message::RotateQuestion => {
                if self.is_closing() || self.question_count < 2 {
                    return Command::None;
                }
                self.question_index = (self.question_index + 1) % self.question_count;
                Command::ShowQuestion {
                    index: self.question_index,
                    next_in: self.rotate_interval,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    WindowAttached,
    Hover { choice: Choice, hovering: bool },
    Answered(Choice),
    ExitDelayElapsed,
    RotateQuestion,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(delay_ms: u64) -> AppState {
        AppState::new(Chrome::default(), Duration::from_millis(delay_ms), 1, None)
    }

    #[test]
    fn both_answers_behave_the_same() {
        for delay in [0, 1000] {
            let mut yes = state(delay);
            let mut no = state(delay);
            assert_eq!(
                yes.update(Message::Answered(Choice::Yes)),
                no.update(Message::Answered(Choice::No))
            );
            assert_eq!(yes.phase, no.phase);
        }
    }

    #[test]
    fn zero_delay_exits_right_away() {
        let mut state = state(0);
        assert_eq!(state.update(Message::Answered(Choice::No)), Command::Exit);
        assert_eq!(state.phase, Phase::Terminated);
    }

    #[test]
    fn delayed_exit_waits_for_timer() {
        let mut state = state(1000);
        assert_eq!(
            state.update(Message::Answered(Choice::No)),
            Command::ScheduleExit(Duration::from_secs(1))
        );
        assert_eq!(state.phase, Phase::Terminating);

        assert_eq!(state.update(Message::ExitDelayElapsed), Command::Exit);
        assert_eq!(state.phase, Phase::Terminated);
    }

    #[test]
    fn second_answer_is_ignored() {
        let mut state = state(1000);
        state.update(Message::Answered(Choice::Yes));
        assert_eq!(state.update(Message::Answered(Choice::No)), Command::None);
    }

    #[test]
    fn stray_timer_does_nothing() {
        let mut state = state(1000);
        assert_eq!(state.update(Message::ExitDelayElapsed), Command::None);
        assert_eq!(state.phase, Phase::Unattached);
    }

    #[test]
    fn chrome_applies_once() {
        let mut state = state(0);
        assert!(!state.customized);

        assert!(matches!(
            state.update(Message::WindowAttached),
            Command::CustomizeWindow(_)
        ));
        assert_eq!(state.phase, Phase::Attached);
        assert_eq!(state.update(Message::WindowAttached), Command::None);
    }

    #[test]
    fn hover_flags_are_independent() {
        let mut state = state(0);
        let command = state.update(Message::Hover {
            choice: Choice::Yes,
            hovering: true,
        });
        assert_eq!(
            command,
            Command::RestyleButton {
                choice: Choice::Yes,
                hovered: true
            }
        );
        assert_eq!(state.hover, HoverFlags { yes: true, no: false });

        state.update(Message::Hover {
            choice: Choice::No,
            hovering: true,
        });
        state.update(Message::Hover {
            choice: Choice::Yes,
            hovering: false,
        });
        assert!(!state.hover.get(Choice::Yes));
        assert!(state.hover.get(Choice::No));
    }

    #[test]
    fn repeated_hover_is_a_no_op() {
        let mut state = state(0);
        let enter = Message::Hover {
            choice: Choice::No,
            hovering: true,
        };
        state.update(enter);
        assert_eq!(state.update(enter), Command::None);
    }

    #[test]
    fn questions_rotate_and_wrap() {
        let interval = Some(Duration::from_millis(2500));
        let mut state = AppState::new(Chrome::default(), Duration::ZERO, 3, interval);

        let indices: Vec<_> = (0..4)
            .map(|_| match state.update(Message::RotateQuestion) {
                Command::ShowQuestion { index, next_in } => {
                    assert_eq!(next_in, interval);
                    index
                }
                other => panic!("unexpected command: {other:?}"),
            })
            .collect();
        assert_eq!(indices, vec![1, 2, 0, 1]);
    }

    #[test]
    fn rotation_stops_when_closing() {
        let mut state = AppState::new(
            Chrome::default(),
            Duration::from_secs(1),
            2,
            Some(Duration::from_secs(2)),
        );
        state.update(Message::Answered(Choice::Yes));
        assert_eq!(state.update(Message::RotateQuestion), Command::None);
        assert_eq!(state.question_index, 0);
    }

    #[test]
    fn single_question_never_rotates() {
        let mut state = state(0);
        assert_eq!(state.update(Message::RotateQuestion), Command::None);
    }
}
