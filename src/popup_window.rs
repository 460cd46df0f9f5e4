use std::path::Path;

use gtk4::{
    gdk::Display, prelude::*, Align, Application, ApplicationWindow, Button, CssProvider,
    EventControllerMotion, HeaderBar, Label, Orientation, Stack, StackTransitionType,
    STYLE_PROVIDER_PRIORITY_APPLICATION,
};
use gtk4_layer_shell::{Edge, Layer, LayerShell};
use log::{debug, warn};

use crate::{
    animation,
    app::{App, PopupView},
    app_state::{Choice, Message},
    config::{Chrome, Placement, Settings},
};

const WINDOW_WIDTH: i32 = 300;
const WINDOW_HEIGHT: i32 = 130;
const OVERLAY_MARGIN: i32 = 20;
const IMAGE_SIZE: i32 = 60;
const BUTTON_WIDTH: i32 = 45;
const BUTTON_HEIGHT: i32 = 20;
const BUTTON_SPACING: i32 = 12;
const QUESTION_FADE_MS: u32 = 300;

const HOVERED_CLASS: &str = "hovered";
const ATTACHED_CLASS: &str = "attached";

const BASE_STYLESHEET: &str = include_str!("../assets/style.css");

pub struct PopupWindow {
    window: ApplicationWindow,
    content: gtk4::Box,
    questions: Stack,
    yes: Button,
    no: Button,
    chrome_provider: CssProvider,
}

impl PopupWindow {
    /// Builds the widget tree. Chrome is left alone until the content is realized.
    pub fn build(app: &Application, settings: &Settings) -> Self {
        load_stylesheets(settings.stylesheet.as_deref());

        let window = Self::create_window(app, settings.placement);
        window.set_titlebar(Some(&Self::title_bar()));

        let content = gtk4::Box::new(Orientation::Vertical, 8);
        content.add_css_class("popup-content");

        let questions = Self::question_stack(&settings.questions);
        content.append(&Self::message_row(settings, &questions));

        let yes = answer_button(Choice::Yes);
        let no = answer_button(Choice::No);
        let answers = gtk4::Box::new(Orientation::Horizontal, BUTTON_SPACING);
        answers.set_halign(Align::Center);
        answers.set_hexpand(true);
        answers.append(&yes);
        answers.append(&no);
        content.append(&answers);

        window.set_child(Some(&content));

        Self {
            window,
            content,
            questions,
            yes,
            no,
            chrome_provider: CssProvider::new(),
        }
    }

    fn create_window(app: &Application, placement: Placement) -> ApplicationWindow {
        let window = ApplicationWindow::builder()
            .application(app)
            .title("areyouhappy")
            .default_width(WINDOW_WIDTH)
            .default_height(WINDOW_HEIGHT)
            .resizable(false)
            .build();
        window.add_css_class("popup-window");

        if placement == Placement::Overlay {
            window.init_layer_shell();
            window.set_layer(Layer::Overlay);
            let anchors = [
                (Edge::Left, false),
                (Edge::Right, true),
                (Edge::Top, true),
                (Edge::Bottom, false),
            ];
            for (anchor, state) in anchors {
                window.set_anchor(anchor, state);
            }
            window.set_margin(Edge::Right, OVERLAY_MARGIN);
            window.set_margin(Edge::Top, OVERLAY_MARGIN);
        }
        window
    }

    /// Title-less header showing only the close button.
    fn title_bar() -> HeaderBar {
        let header = HeaderBar::new();
        header.set_show_title_buttons(true);
        header.set_decoration_layout(Some(":close"));
        header.set_title_widget(Some(&Label::new(None)));
        header.add_css_class("popup-titlebar");
        header
    }

    fn message_row(settings: &Settings, questions: &Stack) -> gtk4::Box {
        let row = gtk4::Box::new(Orientation::Horizontal, 8);
        row.append(&animation::picture(&settings.assets_dir(), &settings.image, IMAGE_SIZE));

        let text = gtk4::Box::new(Orientation::Vertical, 4);
        text.set_valign(Align::Center);
        let greeting = Label::new(Some(settings.greeting.as_str()));
        greeting.add_css_class("greeting");
        greeting.set_xalign(0.0);
        text.append(&greeting);
        text.append(questions);
        row.append(&text);
        row
    }

    fn question_stack(questions: &[String]) -> Stack {
        let stack = Stack::new();
        stack.set_transition_type(StackTransitionType::Crossfade);
        stack.set_transition_duration(QUESTION_FADE_MS);
        stack.set_hhomogeneous(false);
        for (index, question) in questions.iter().enumerate() {
            let label = Label::new(Some(question.as_str()));
            label.add_css_class("question");
            label.set_xalign(0.0);
            label.set_ellipsize(pango::EllipsizeMode::End);
            stack.add_named(&label, Some(question_name(index).as_str()));
        }
        stack
    }

    /// Routes pointer, click and realize signals into `app`.
    pub fn connect(&self, app: &App) {
        for choice in Choice::ALL {
            let button = self.button(choice);
            let motion = EventControllerMotion::new();
            let on_enter = app.clone();
            motion.connect_enter(move |_, _, _| {
                on_enter.handle_message(Message::Hover {
                    choice,
                    hovering: true,
                });
            });
            let on_leave = app.clone();
            motion.connect_leave(move |_| {
                on_leave.handle_message(Message::Hover {
                    choice,
                    hovering: false,
                });
            });
            button.add_controller(motion);

            let on_click = app.clone();
            button.connect_clicked(move |_| {
                on_click.handle_message(Message::Answered(choice));
            });
        }

        let on_attach = app.clone();
        self.content.connect_realize(move |_| {
            on_attach.handle_message(Message::WindowAttached);
        });
    }

    pub fn present(&self) {
        self.window.present();
    }

    fn button(&self, choice: Choice) -> &Button {
        match choice {
            Choice::Yes => &self.yes,
            Choice::No => &self.no,
        }
    }
}

impl PopupView for PopupWindow {
    fn customize_chrome(&self, chrome: &Chrome) {
        let Some(window) = self.content.root().and_downcast::<gtk4::Window>() else {
            debug!("content has no window, chrome left as is");
            return;
        };
        window.set_opacity(chrome.opacity);
        self.chrome_provider.load_from_data(&chrome.to_css());
        gtk4::style_context_add_provider_for_display(
            &WidgetExt::display(&window),
            &self.chrome_provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION + 1,
        );
        window.add_css_class(ATTACHED_CLASS);
    }

    fn set_button_hovered(&self, choice: Choice, hovered: bool) {
        let button = self.button(choice);
        if hovered {
            button.add_css_class(HOVERED_CLASS);
        } else {
            button.remove_css_class(HOVERED_CLASS);
        }
    }

    fn show_question(&self, index: usize) {
        self.questions.set_visible_child_name(&question_name(index));
    }
}

fn answer_button(choice: Choice) -> Button {
    let button = Button::with_label(choice.label());
    button.add_css_class("answer");
    button.set_size_request(BUTTON_WIDTH, BUTTON_HEIGHT);
    button.set_valign(Align::Center);
    button
}

fn question_name(index: usize) -> String {
    format!("question-{index}")
}

fn load_stylesheets(user: Option<&Path>) {
    let Some(display) = Display::default() else {
        warn!("no display, skipping stylesheets");
        return;
    };
    let base = CssProvider::new();
    base.load_from_data(BASE_STYLESHEET);
    gtk4::style_context_add_provider_for_display(
        &display,
        &base,
        STYLE_PROVIDER_PRIORITY_APPLICATION,
    );

    if let Some(path) = user {
        debug!("loading stylesheet {:?}", path);
        let provider = CssProvider::new();
        provider.load_from_path(path);
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION + 2,
        );
    }
}
