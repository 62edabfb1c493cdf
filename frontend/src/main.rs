mod components;

use components::handlers;
use components::results::render_status;
use components::upload_section::render_upload_section;
use gloo_file::File as GlooFile;
use gloo_file::callbacks::FileReader;
use shared::Transport;
use yew::prelude::*;

// The three UI states: idle, waiting on the server, or finished.
#[derive(Clone, PartialEq)]
enum Status {
    Idle,
    Loading,
    Recognized(String),
    Failed(String),
}

impl Status {
    /// A request is in flight; inputs that would start another are locked.
    fn is_loading(&self) -> bool {
        matches!(self, Status::Loading)
    }
}

enum Msg {
    FileSelected(Option<GlooFile>),
    PreviewLoaded(Result<String, String>),
    SetTransport(Transport),
    Submit,
    PredictionReceived(Result<String, String>),
    Reset,
}

struct Model {
    file: Option<GlooFile>,
    preview: Option<String>,
    // Kept alive until the data URI arrives; dropping it aborts the read.
    reader: Option<FileReader>,
    transport: Transport,
    status: Status,
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            file: None,
            preview: None,
            reader: None,
            transport: Transport::Multipart,
            status: Status::Idle,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::FileSelected(file) => handlers::handle_file_selected(self, ctx, file),
            Msg::PreviewLoaded(result) => handlers::handle_preview_loaded(self, result),
            Msg::SetTransport(_) if self.status.is_loading() => false,
            Msg::SetTransport(transport) => {
                self.transport = transport;
                self.status = Status::Idle;
                true
            }
            Msg::Submit => handlers::handle_submit(self, ctx),
            Msg::PredictionReceived(result) => {
                self.status = match result {
                    Ok(label) => Status::Recognized(label),
                    Err(message) => Status::Failed(message),
                };
                true
            }
            Msg::Reset => {
                self.file = None;
                self.preview = None;
                self.reader = None;
                self.status = Status::Idle;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                <header class="app-header">
                    <h1>{"Animal Recognizer"}</h1>
                    <p>{"Upload an image of an animal and find out what it is."}</p>
                </header>

                <main class="main-content">
                    { render_upload_section(self, ctx) }
                    { render_status(&self.status) }
                </main>
            </div>
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<Model>::new().render();
}
