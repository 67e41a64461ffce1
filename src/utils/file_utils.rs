use std::fs;
use std::io::Write;
use std::path::PathBuf;

use log::{debug, error};
use path_clean::PathClean;

pub fn get_working_path(wd: &str) -> String {
    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if wd.is_empty() {
        String::from(current_dir.to_str().unwrap_or("."))
    } else {
        let work_path = PathBuf::from(wd);
        let wdpath = match fs::metadata(&work_path) {
            Ok(md) => {
                if md.is_dir() && !md.permissions().readonly() {
                    work_path.canonicalize().ok()
                } else {
                    error!("Path not found {:?}", &work_path);
                    None
                }
            }
            Err(_) => None,
        };
        let rp: PathBuf = wdpath.unwrap_or_else(|| current_dir.join(wd));
        match rp.canonicalize() {
            Ok(ap) => String::from(ap.to_str().unwrap_or("./")),
            Err(_) => {
                error!("Path not found {:?}", &rp);
                String::from("./")
            }
        }
    }
}

pub fn get_file_path(wd: &str, path: Option<PathBuf>) -> Option<PathBuf> {
    path.map(|p| {
        if p.is_relative() {
            PathBuf::from(wd).join(&p).clean()
        } else {
            p
        }
    })
}

pub fn persist_file(persist_file: Option<PathBuf>, text: &str) {
    if let Some(path_buf) = persist_file {
        let filename = &path_buf.to_str().unwrap_or("?");
        match fs::File::create(&path_buf) {
            Ok(mut file) => match file.write_all(text.as_bytes()) {
                Ok(()) => debug!("persisted: {filename}"),
                Err(e) => error!("failed to persist file {filename}, {e}"),
            },
            Err(e) => error!("failed to persist file {filename}, {e}"),
        }
    }
}

pub fn prepare_persist_path(file_name: &str, date_prefix: &str) -> PathBuf {
    let now = chrono::Local::now();
    let timestamp = now.format("%Y%m%d_%H%M%S").to_string();
    let filename = file_name.replace("{}", format!("{date_prefix}{timestamp}").as_str());
    PathBuf::from(filename)
}
