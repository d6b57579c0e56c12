use crate::{Error, Json, Mediawiki, QueryBuilder};

pub trait Pages {
    /// Enumerates every page on the wiki via `list=allpages`.
    fn query_all_pages(&self) -> QueryBuilder;
    /// Fetches the rendered content of one page; the whole `action=parse`
    /// response is returned verbatim.
    fn parse_page(&self, title: &str) -> Result<Json, Error>;
    /// Fetches the full revision history of one page, verbatim.
    fn query_revisions(&self, title: &str) -> Result<Json, Error>;
}
impl Pages for Mediawiki {
    fn query_all_pages(&self) -> QueryBuilder {
        let mut query = self.query("allpages");
        query.arg("list", "allpages");
        query.arg("aplimit", "max");
        query
    }
    fn parse_page(&self, title: &str) -> Result<Json, Error> {
        let mut request = self.request();
        request.arg("action", "parse");
        request.arg("page", title);
        request.get()
    }
    fn query_revisions(&self, title: &str) -> Result<Json, Error> {
        let mut request = self.request();
        request.arg("action", "query");
        request.arg("prop", "revisions");
        request.arg("titles", title);
        request.arg("rvprop", "content|timestamp|user");
        request.arg("rvlimit", "max");
        request.get()
    }
}
