use super::super::{Model, Msg};
use gloo_file::File as GlooFile;
use shared::Transport;
use web_sys::HtmlInputElement;
use yew::prelude::*;

pub fn render_upload_section(model: &Model, ctx: &Context<Model>) -> Html {
    let link = ctx.link();
    let handle_change = link.callback(|e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        let file = input
            .files()
            .and_then(|files| files.item(0))
            .map(GlooFile::from);
        Msg::FileSelected(file)
    });

    let loading = model.status.is_loading();
    let ready = match model.transport {
        Transport::Multipart => model.file.is_some(),
        Transport::Inline => model.preview.is_some(),
    };

    html! {
        <div class="upload-section">
            { render_transport_toggle(model, ctx) }

            <input
                type="file"
                id="file-input"
                accept="image/*"
                onchange={handle_change}
            />

            { render_preview(model) }

            <button
                class="analyze-btn"
                disabled={!ready || loading}
                onclick={link.callback(|_| Msg::Submit)}
            >
                { if loading { "Recognizing..." } else { "Recognize Animal" } }
            </button>
            <button class="reset-btn" onclick={link.callback(|_| Msg::Reset)}>
                {"Reset"}
            </button>
        </div>
    }
}

fn render_transport_toggle(model: &Model, ctx: &Context<Model>) -> Html {
    let options = [
        (Transport::Multipart, "Form upload"),
        (Transport::Inline, "Inline base64"),
    ];
    let loading = model.status.is_loading();

    html! {
        <div class="transport-toggle">
            { for options.into_iter().map(|(transport, label)| html! {
                <label>
                    <input
                        type="radio"
                        name="transport"
                        value={transport.to_string()}
                        checked={model.transport == transport}
                        disabled={loading}
                        onchange={ctx.link().callback(move |_| Msg::SetTransport(transport))}
                    />
                    { label }
                </label>
            }) }
        </div>
    }
}

fn render_preview(model: &Model) -> Html {
    match &model.preview {
        Some(data_uri) => html! {
            <div class="preview-area">
                <p>{"Preview:"}</p>
                <img src={data_uri.clone()} alt="Preview" />
            </div>
        },
        None => html! {},
    }
}
