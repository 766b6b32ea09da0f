pub mod http_renderer;
pub mod mock_renderer;
pub mod webdriver;

mod renderer;
pub use http_renderer::HttpRenderer;
pub use mock_renderer::{MockPage, MockRenderer, MockResponse};
pub use renderer::{RenderSession, Renderer, SessionGuard};
pub use webdriver::WebDriverRenderer;
