use std::{cell::RefCell, rc::Rc, time::Duration};

use glib::timeout_add_local_once;
use gtk4::{prelude::ApplicationExt, Application};
use log::{debug, info};

use crate::{
    app_state::{AppState, Choice, Message},
    config::Chrome,
};

/// Ends the process.
pub trait Lifecycle {
    fn terminate(&self);
}

/// Runs a callback once after a delay on the UI thread.
pub trait Scheduler {
    fn after(&self, delay: Duration, callback: Box<dyn FnOnce()>);
}

/// What the controller can do to the widgets on screen.
pub trait PopupView {
    fn customize_chrome(&self, chrome: &Chrome);
    fn set_button_hovered(&self, choice: Choice, hovered: bool);
    fn show_question(&self, index: usize);
}

pub struct GtkLifecycle {
    app: Application,
}

impl GtkLifecycle {
    pub fn new(app: Application) -> Self {
        Self { app }
    }
}

impl Lifecycle for GtkLifecycle {
    fn terminate(&self) {
        info!("quitting");
        self.app.quit();
    }
}

pub struct GlibScheduler;

impl Scheduler for GlibScheduler {
    fn after(&self, delay: Duration, callback: Box<dyn FnOnce()>) {
        timeout_add_local_once(delay, callback);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CustomizeWindow(Chrome),
    RestyleButton { choice: Choice, hovered: bool },
    ShowQuestion { index: usize, next_in: Option<Duration> },
    ScheduleExit(Duration),
    Exit,
    None,
}

#[derive(Clone)]
pub struct App {
    pub state: Rc<RefCell<AppState>>,
    view: Rc<dyn PopupView>,
    lifecycle: Rc<dyn Lifecycle>,
    scheduler: Rc<dyn Scheduler>,
}

impl App {
    pub fn new(
        state: AppState,
        view: Rc<dyn PopupView>,
        lifecycle: Rc<dyn Lifecycle>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
            view,
            lifecycle,
            scheduler,
        }
    }

    /// Arms the question rotation timer, if rotation is enabled.
    pub fn start(&self) {
        let interval = self.state.borrow().rotate_interval();
        if let Some(interval) = interval {
            debug!("rotating questions every {:?}", interval);
            self.schedule(interval, Message::RotateQuestion);
        }
    }

    pub fn handle_message(&self, message: Message) {
        let command = self.state.borrow_mut().update(message);
        self.execute_command(command);
    }

    pub fn execute_command(&self, command: Command) {
        match command {
            Command::CustomizeWindow(chrome) => {
                self.view.customize_chrome(&chrome);
            }
            Command::RestyleButton { choice, hovered } => {
                self.view.set_button_hovered(choice, hovered);
            }
            Command::ShowQuestion { index, next_in } => {
                self.view.show_question(index);
                if let Some(interval) = next_in {
                    self.schedule(interval, Message::RotateQuestion);
                }
            }
            Command::ScheduleExit(delay) => {
                info!("exiting in {:?}", delay);
                self.schedule(delay, Message::ExitDelayElapsed);
            }
            Command::Exit => {
                self.lifecycle.terminate();
            }
            Command::None => {}
        }
    }

    fn schedule(&self, delay: Duration, message: Message) {
        let app = self.clone();
        self.scheduler.after(delay, Box::new(move || app.handle_message(message)));
    }
}
