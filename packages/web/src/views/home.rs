use dioxus::prelude::*;
use ui::views::BoardView;

/// Landing page: the task board.
#[component]
pub fn Home() -> Element {
    rsx! {
        BoardView {}
    }
}
