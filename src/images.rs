use crate::{Error, Mediawiki, QueryBuilder};

pub trait Images {
    /// Enumerates every uploaded file via `list=allimages`; each item carries
    /// at least `name` and `url`.
    fn query_all_images(&self) -> QueryBuilder;
    fn download_image(&self, url: &str) -> Result<Vec<u8>, Error>;
}
impl Images for Mediawiki {
    fn query_all_images(&self) -> QueryBuilder {
        let mut query = self.query("allimages");
        query.arg("list", "allimages");
        query.arg("ailimit", "max");
        query
    }
    fn download_image(&self, url: &str) -> Result<Vec<u8>, Error> {
        self.download(url)
    }
}

/// Last path segment of an image URL, used as the local filename.
pub fn filename(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}
