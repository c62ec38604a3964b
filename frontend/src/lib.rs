use seed::{prelude::*, virtual_dom::AtValue, *};
use shared::{PlannedTrip, Trip, TripHistory, TripRequest};
use uuid::Uuid;
use wasm_bindgen::prelude::wasm_bindgen;

mod config;
pub mod form;
pub mod geocode;
mod geolocation;
pub mod map;
pub mod panel;
pub mod session;
pub mod trips;

use session::RouteSession;
use trips::SubmitError;

const NOTICE_TTL_MS: u32 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    fn class(self) -> &'static str {
        match self {
            Self::Info => "notice-info",
            Self::Warning => "notice-warning",
            Self::Error => "notice-error",
        }
    }
}

struct Notice {
    id: Uuid,
    level: NoticeLevel,
    text: String,
    sticky: bool,
}

impl Notice {
    fn transient(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            text: text.into(),
            sticky: false,
        }
    }

    fn sticky(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            sticky: true,
            ..Self::transient(level, text)
        }
    }
}

/// Business rejections carry the planner's own message and stay on screen
/// until dismissed; transport and decode failures expire as a generic toast.
fn submit_failure_notice(error: &SubmitError) -> Notice {
    match error {
        SubmitError::Backend(message) => Notice::sticky(NoticeLevel::Error, message.clone()),
        _ => Notice::transient(
            NoticeLevel::Error,
            "Trip submission failed. Please try again.",
        ),
    }
}

pub struct Model {
    session: RouteSession,
    recent_trip: Option<Trip>,
    history: Vec<Trip>,
    history_loading: bool,
    submitting: bool,
    sidebar_expanded: bool,
    user_menu_open: bool,
    notices: Vec<Notice>,
    map: map::Model,
    form: Option<form::Model>,
    panel: panel::Model,
}

pub enum Msg {
    Map(map::Msg),
    Form(form::Msg),
    Panel(panel::Msg),
    UserMenuToggled,
    SidebarToggled,
    WindowClicked,
    TripDialogClosed,
    HistoryFetched(Result<TripHistory, SubmitError>),
    TripPlanned(Result<PlannedTrip, SubmitError>),
    NoticeClosed(Uuid),
}

pub fn init(_: Url, orders: &mut impl Orders<Msg>) -> Model {
    orders.stream(streams::window_event(Ev::Click, |_| Msg::WindowClicked));
    orders.perform_cmd(async { Msg::HistoryFetched(trips::fetch_history().await) });
    Model {
        session: RouteSession::new(),
        recent_trip: None,
        history: Vec::new(),
        history_loading: true,
        submitting: false,
        sidebar_expanded: false,
        user_menu_open: false,
        notices: Vec::new(),
        map: map::init(&mut orders.proxy(Msg::Map)),
        form: None,
        panel: panel::Model::new(),
    }
}

pub fn update(msg: Msg, model: &mut Model, orders: &mut impl Orders<Msg>) {
    match msg {
        Msg::Map(msg) => {
            if let Some(event) = map::update(msg, &mut model.map, &mut model.session) {
                apply_map_event(model, event, orders);
            }
        }
        Msg::Form(msg) => {
            let Some(form) = &mut model.form else { return };
            if let Some(event) = form::update(msg, form, &mut orders.proxy(Msg::Form)) {
                apply_form_event(model, event, orders);
            }
        }
        Msg::Panel(msg) => {
            if let Some(panel::Event::PlanTripRequested) = panel::update(msg, &mut model.panel) {
                open_trip_dialog(model, orders);
            }
        }
        Msg::UserMenuToggled => model.user_menu_open = !model.user_menu_open,
        Msg::SidebarToggled => model.sidebar_expanded = !model.sidebar_expanded,
        Msg::WindowClicked => {
            model.user_menu_open = false;
            map::update(map::Msg::MenuDismissed, &mut model.map, &mut model.session);
        }
        Msg::TripDialogClosed => model.form = None,
        Msg::HistoryFetched(result) => {
            model.history_loading = false;
            match result {
                Ok(history) => {
                    if let Some(envelope) = history.recent_trip {
                        model.recent_trip = Some(envelope.canonicalize().trip);
                    }
                    model.history = history
                        .all_trips
                        .into_iter()
                        .map(|envelope| envelope.canonicalize().trip)
                        .collect();
                }
                Err(err) => {
                    web_sys::console::error_1(
                        &format!("[frontend] history fetch failed: {err}").into(),
                    );
                    push_notice(
                        model,
                        orders,
                        Notice::transient(NoticeLevel::Error, "Could not load trip history."),
                    );
                }
            }
        }
        Msg::TripPlanned(result) => {
            model.submitting = false;
            match result {
                Ok(planned) => {
                    model.recent_trip = Some(trips::absorb_planned(&mut model.session, planned));
                    map::redraw_routes(&model.session);
                    model.form = None;
                    push_notice(
                        model,
                        orders,
                        Notice::transient(NoticeLevel::Info, "Trip planned successfully."),
                    );
                    orders.perform_cmd(async { Msg::HistoryFetched(trips::fetch_history().await) });
                }
                Err(error) => {
                    if !matches!(error, SubmitError::Backend(_)) {
                        web_sys::console::error_1(
                            &format!("[frontend] trip submission failed: {error}").into(),
                        );
                    }
                    push_notice(model, orders, submit_failure_notice(&error));
                }
            }
        }
        Msg::NoticeClosed(id) => model.notices.retain(|notice| notice.id != id),
    }
}

fn apply_map_event(model: &mut Model, event: map::Event, orders: &mut impl Orders<Msg>) {
    match event {
        map::Event::PlanRequested(request) => begin_submission(model, request, orders),
        map::Event::Notified(level, text) => {
            push_notice(model, orders, Notice::transient(level, text));
        }
    }
}

fn apply_form_event(model: &mut Model, event: form::Event, orders: &mut impl Orders<Msg>) {
    match event {
        form::Event::SubmitRequested(request) => begin_submission(model, request, orders),
        form::Event::DismissRequested => model.form = None,
        form::Event::Notified(level, text) => {
            push_notice(model, orders, Notice::transient(level, text));
        }
    }
}

fn open_trip_dialog(model: &mut Model, orders: &mut impl Orders<Msg>) {
    if model.form.is_none() {
        model.form = Some(form::init(&mut orders.proxy(Msg::Form)));
    }
}

/// One submission at a time; every submit surface stays disabled until the
/// running one settles.
fn begin_submission(model: &mut Model, request: TripRequest, orders: &mut impl Orders<Msg>) {
    if model.submitting {
        return;
    }
    model.submitting = true;
    orders.perform_cmd(async move { Msg::TripPlanned(trips::submit(request).await) });
}

fn push_notice(model: &mut Model, orders: &mut impl Orders<Msg>, notice: Notice) {
    if !notice.sticky {
        let id = notice.id;
        orders.perform_cmd(cmds::timeout(NOTICE_TTL_MS, move || Msg::NoticeClosed(id)));
    }
    model.notices.push(notice);
}

pub(crate) fn bool_attr(value: bool) -> AtValue {
    if value {
        AtValue::Some("true".into())
    } else {
        AtValue::Ignored
    }
}

pub fn view(model: &Model) -> Node<Msg> {
    div![
        C!["app-shell"],
        view_header(model),
        div![
            C!["workspace"],
            view_sidebar(model),
            panel::view(
                &model.panel,
                model.recent_trip.as_ref(),
                &model.history,
                model.history_loading,
            )
            .map_msg(Msg::Panel),
            map::view(&model.map, model.submitting).map_msg(Msg::Map),
        ],
        view_dialog(model),
        view_notices(model),
    ]
}

fn view_header(model: &Model) -> Node<Msg> {
    header![
        C!["app-header"],
        h1![C!["brand"], "RigRoute"],
        div![
            C!["user-menu"],
            button![
                C!["avatar"],
                "D",
                ev(Ev::Click, |event| {
                    event.stop_propagation();
                    Msg::UserMenuToggled
                }),
            ],
            if model.user_menu_open {
                ul![
                    C!["menu-dropdown"],
                    li!["Profile"],
                    li!["Settings"],
                    li!["Sign out"],
                ]
            } else {
                empty![]
            },
        ],
    ]
}

fn view_sidebar(model: &Model) -> Node<Msg> {
    nav![
        C!["sidebar", IF!(model.sidebar_expanded => "expanded")],
        ul![
            li![C!["nav-item"], span![C!["nav-label"], "Map"]],
            li![C!["nav-item"], span![C!["nav-label"], "Profile"]],
            li![C!["nav-item"], span![C!["nav-label"], "Settings"]],
        ],
        button![
            C!["sidebar-toggle"],
            if model.sidebar_expanded {
                "\u{00ab}"
            } else {
                "\u{00bb}"
            },
            ev(Ev::Click, |event| {
                event.stop_propagation();
                Msg::SidebarToggled
            }),
        ],
    ]
}

fn view_dialog(model: &Model) -> Node<Msg> {
    let Some(form) = &model.form else {
        return empty![];
    };
    div![
        C!["modal-backdrop"],
        div![
            C!["modal"],
            div![
                C!["modal-header"],
                h2!["Enter Trip Details"],
                button![
                    C!["modal-close"],
                    "\u{00d7}",
                    attrs! { At::Type => "button" },
                    ev(Ev::Click, |_| Msg::TripDialogClosed),
                ],
            ],
            form::view(form, model.submitting).map_msg(Msg::Form),
        ],
    ]
}

fn view_notices(model: &Model) -> Node<Msg> {
    div![
        C!["notices"],
        model.notices.iter().map(view_notice).collect::<Vec<_>>(),
    ]
}

fn view_notice(notice: &Notice) -> Node<Msg> {
    let id = notice.id;
    div![
        C!["notice", notice.level.class()],
        span![notice.text.clone()],
        IF!(notice.sticky => button![
            C!["notice-dismiss"],
            "\u{00d7}",
            attrs! { At::Type => "button" },
            ev(Ev::Click, move |_| Msg::NoticeClosed(id)),
        ]),
    ]
}

#[wasm_bindgen(start)]
pub fn start() {
    map::mount();
    App::start("app", init, update, view);
}
