pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod exception;
pub mod param;
pub mod request;
pub mod response;
pub mod router;
pub mod settings;

pub use config::Config;
pub use controller::{Action, Controller, ControllerBase, ErrorController};
pub use dispatcher::Dispatcher;
pub use exception::Exception;
pub use param::{HttpRequestMethod, HttpVersion};
pub use request::Request;
pub use response::{Response, ResponseDeclaration};
pub use router::{Route, RouteMatch, RouteTable};
pub use settings::{Settings, SettingsBuilder};
