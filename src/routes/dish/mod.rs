mod handler;
mod model;

pub use handler::{create_dish, delete_dish, list_dishes, update_dish};
pub use model::{CreateDishRequest, DishView, UpdateDishRequest};
