use actix_files as fs;
use actix_web::{error, get, web, Error};
use std::path::{Component, PathBuf};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_file);
}

#[get("/assets/{filename:.*}")]
async fn view_file(filename: web::Path<String>) -> Result<fs::NamedFile, Error> {
    let req_path = PathBuf::from(filename.into_inner());
    // Only plain segments; nothing may climb out of the asset directory.
    if req_path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(error::ErrorNotFound("File not found."));
    }

    let mut path: PathBuf = PathBuf::from("public/assets/");
    path.push(req_path);

    let file = fs::NamedFile::open(path)?;

    Ok(file.use_last_modified(true))
}
