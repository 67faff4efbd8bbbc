use rocket::Route;

mod admin;
mod common;
mod results;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(voting::routes());
    routes.extend(results::routes());
    routes.extend(admin::routes());
    routes
}
