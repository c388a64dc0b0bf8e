mod handler;
mod model;

pub use handler::{create_menu, delete_menu, get_menu, list_menus, update_menu};
pub(crate) use handler::load_owned_menu;
pub use model::{CreateMenuRequest, MenuDetail, UpdateMenuRequest};
