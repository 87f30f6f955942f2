pub mod auth_handler;

pub use auth_handler::{
    __path_get_me, __path_login, __path_register, __path_update_details, __path_update_password,
    get_me, login, register, update_details, update_password,
};
