use super::super::Status;
use super::utils::render_error_message;
use yew::prelude::*;

pub fn render_status(status: &Status) -> Html {
    match status {
        Status::Idle => html! {},
        Status::Loading => html! {
            <p class="loading-message">{"Recognizing..."}</p>
        },
        Status::Recognized(label) => html! {
            <div class="results-container">
                <p class="result-label">{"Animal Recognized:"}</p>
                <h2 class="result-value">{ label.clone() }</h2>
            </div>
        },
        Status::Failed(message) => render_error_message(message),
    }
}
