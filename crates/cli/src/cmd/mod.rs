mod render;
mod serve;
mod source;

pub use render::cmd_render;
pub use serve::{ServeArgs, cmd_serve};
pub use source::ChartArgs;
