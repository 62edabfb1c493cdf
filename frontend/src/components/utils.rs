use wasm_bindgen::JsValue;
use yew::prelude::*;

pub fn js_error(err: JsValue) -> String {
    format!("{:?}", err)
}

pub fn render_error_message(message: &str) -> Html {
    html! {
        <div class="error-message">
            <p>{ message.to_string() }</p>
        </div>
    }
}
