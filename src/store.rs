//! On-disk layout shared by the fetcher and the dump assembler: `pages/`,
//! `revisions/`, and `images/` under one root, with `titles.txt` beside them.
//! A file that already exists is treated as done and never rewritten.

use crate::{Error, Json};
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub struct Store {
    root: PathBuf,
    illegal: Regex,
}
impl Store {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Store, Error> {
        let root = root.as_ref().to_owned();
        for dir in ["pages", "revisions", "images"] {
            fs::create_dir_all(root.join(dir))?;
        }
        Ok(Store {
            root,
            illegal: Regex::new(r#"[\\/:*?"<>|]"#).unwrap(),
        })
    }
    /// Replaces filesystem-illegal characters with underscores.
    pub fn sanitize(&self, title: &str) -> String {
        self.illegal.replace_all(title, "_").into_owned()
    }

    pub fn page_path(&self, title: &str) -> PathBuf {
        self.root
            .join("pages")
            .join(format!("{}.json", self.sanitize(title)))
    }
    pub fn revisions_path(&self, title: &str) -> PathBuf {
        self.root
            .join("revisions")
            .join(format!("{}_revisions.json", self.sanitize(title)))
    }
    pub fn image_path(&self, name: &str) -> PathBuf {
        self.root.join("images").join(self.sanitize(name))
    }

    pub fn has_page(&self, title: &str) -> bool {
        self.page_path(title).exists()
    }
    pub fn has_revisions(&self, title: &str) -> bool {
        self.revisions_path(title).exists()
    }
    pub fn has_image(&self, name: &str) -> bool {
        self.image_path(name).exists()
    }

    pub fn write_page(&self, title: &str, json: &Json) -> Result<(), Error> {
        fs::write(self.page_path(title), serde_json::to_string_pretty(json)?)?;
        Ok(())
    }
    pub fn write_revisions(&self, title: &str, json: &Json) -> Result<(), Error> {
        fs::write(
            self.revisions_path(title),
            serde_json::to_string_pretty(json)?,
        )?;
        Ok(())
    }
    pub fn write_image(&self, name: &str, data: &[u8]) -> Result<(), Error> {
        fs::write(self.image_path(name), data)?;
        Ok(())
    }
    pub fn write_titles(&self, titles: &[String]) -> Result<(), Error> {
        let mut out = String::new();
        for title in titles {
            out.push_str(title);
            out.push('\n');
        }
        fs::write(self.root.join("titles.txt"), out)?;
        Ok(())
    }

    /// Persisted page snapshots as (title, raw JSON text), sorted by title.
    /// The title is whatever the sanitized filename preserved.
    pub fn pages(&self) -> Result<Vec<(String, String)>, Error> {
        self.entries("pages", ".json")
    }
    pub fn revisions(&self) -> Result<Vec<(String, String)>, Error> {
        self.entries("revisions", "_revisions.json")
    }
    pub fn images(&self) -> Result<Vec<String>, Error> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.root.join("images"))? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
    fn entries(&self, dir: &str, suffix: &str) -> Result<Vec<(String, String)>, Error> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.root.join(dir))? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let title = match name.strip_suffix(suffix) {
                Some(title) => title.to_owned(),
                None => continue,
            };
            entries.push((title, fs::read_to_string(entry.path())?));
        }
        entries.sort();
        Ok(entries)
    }
}
