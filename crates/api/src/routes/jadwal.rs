use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/jadwal",
            get(handlers::jadwal::list_jadwal).post(handlers::jadwal::create_jadwal),
        )
        // Static segments before the :id capture.
        .route("/jadwal/matrix", get(handlers::matrix::get_matrix))
        .route(
            "/jadwal/matrix/update",
            post(handlers::matrix::update_matrix_cell),
        )
        .route(
            "/jadwal/matrix/check-conflict",
            get(handlers::matrix::check_cell_conflict),
        )
        .route("/jadwal/bulk", post(handlers::bulk::bulk_create))
        .route("/jadwal/clone", post(handlers::bulk::clone_week))
        .route(
            "/jadwal/check-conflicts",
            post(handlers::bulk::check_conflicts),
        )
        .route(
            "/jadwal/import-master",
            post(handlers::import::import_master),
        )
        .route(
            "/jadwal/:id",
            put(handlers::jadwal::update_jadwal).delete(handlers::jadwal::delete_jadwal),
        )
        .route(
            "/jadwal/:id/guru",
            get(handlers::jadwal::list_guru).post(handlers::jadwal::add_guru),
        )
        .route(
            "/jadwal/:id/guru/:guru_id",
            axum::routing::delete(handlers::jadwal::remove_guru),
        )
}
