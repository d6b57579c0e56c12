//! Blocking client for the MediaWiki HTTP API, plus the on-disk store and XML
//! dump assembler used by the `titles` and `dump` binaries.

use cookie::{Cookie, CookieJar};
use reqwest::blocking::{Client, Response};
use reqwest::header::{COOKIE, SET_COOKIE};
use serde::Deserialize;
use std::{
    cell::RefCell,
    collections::{BTreeMap, VecDeque},
    fmt, fs, io, mem,
    path::Path,
};

pub mod dump;
pub mod fetch;
pub mod images;
pub mod pages;
pub mod store;

pub type Json = serde_json::Value;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    Io(io::Error),
    Json(serde_json::Error),
    Xml(quick_xml::Error),
    /// The API answered with an `error` member or a shape we don't recognize.
    Api(Json),
}
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Error {
        Error::Http(err)
    }
}
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}
impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Error {
        Error::Xml(err)
    }
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(err) => write!(f, "http error: {}", err),
            Error::Io(err) => write!(f, "io error: {}", err),
            Error::Json(err) => write!(f, "json error: {}", err),
            Error::Xml(err) => write!(f, "xml error: {}", err),
            Error::Api(json) => write!(f, "unexpected api response: {}", json),
        }
    }
}
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Xml(err) => Some(err),
            Error::Api(_) => None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub baseapi: String,
    pub useragent: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}
impl Default for Config {
    fn default() -> Config {
        Config {
            baseapi: "https://tgstation13.org/wiki/api.php".to_owned(),
            useragent: concat!("mwdump/", env!("CARGO_PKG_VERSION")).to_owned(),
            username: None,
            password: None,
        }
    }
}
impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

pub struct Mediawiki {
    client: Client,
    cookies: RefCell<CookieJar>,
    config: Config,
}
impl Mediawiki {
    /// Builds a client and, when the config carries credentials, performs the
    /// two-step login to establish a session.
    pub fn new(config: Config) -> Result<Mediawiki, Error> {
        let client = Client::builder()
            .user_agent(config.useragent.clone())
            .build()?;
        let mw = Mediawiki {
            client,
            cookies: RefCell::new(CookieJar::new()),
            config,
        };
        if mw.config.username.is_some() && mw.config.password.is_some() {
            mw.login(None)?;
        }
        Ok(mw)
    }
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Mediawiki, Error> {
        Mediawiki::new(Config::load(path)?)
    }
    /// Reads the config file when it exists, otherwise uses the built-in
    /// defaults so the binaries run with no setup.
    pub fn from_path_or_default<P: AsRef<Path>>(path: P) -> Result<Mediawiki, Error> {
        if path.as_ref().exists() {
            Mediawiki::from_path(path)
        } else {
            Mediawiki::new(Config::default())
        }
    }
    fn login(&self, token: Option<&str>) -> Result<(), Error> {
        let (name, password) = match (&self.config.username, &self.config.password) {
            (Some(name), Some(password)) => (name.as_str(), password.as_str()),
            _ => return Ok(()),
        };
        let mut request = self.request();
        request.arg("action", "login");
        request.arg("lgname", name);
        request.arg("lgpassword", password);
        if let Some(token) = token {
            request.arg("lgtoken", token);
        }
        let json = request.post()?;
        match json["login"]["result"].as_str() {
            Some("NeedToken") => {
                let token = match json["login"]["token"].as_str() {
                    Some(token) => token.to_owned(),
                    None => return Err(Error::Api(json)),
                };
                self.login(Some(&token))
            }
            Some("Success") => {
                println!("Logged in to {}", self.config.baseapi);
                Ok(())
            }
            _ => Err(Error::Api(json)),
        }
    }
    /// Starts a plain API request; every request carries `format=json`.
    pub fn request(&self) -> RequestBuilder<'_> {
        let mut builder = RequestBuilder {
            mw: self,
            args: BTreeMap::new(),
        };
        builder.arg("format", "json");
        builder
    }
    /// Starts an `action=query` request whose results live under
    /// `query.<key>` in each response batch.
    pub fn query(&self, key: &str) -> QueryBuilder<'_> {
        let mut query = QueryBuilder {
            mw: self,
            key: key.to_owned(),
            args: BTreeMap::new(),
        };
        query.arg("format", "json");
        query.arg("action", "query");
        query
    }
    /// Raw GET of an arbitrary URL, used for image files.
    pub fn download(&self, url: &str) -> Result<Vec<u8>, Error> {
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
    fn send(&self, args: &BTreeMap<String, String>, post: bool) -> Result<Json, Error> {
        let request = if post {
            self.client.post(&self.config.baseapi).form(args)
        } else {
            self.client.get(&self.config.baseapi).query(args)
        };
        let request = match self.cookie_header() {
            Some(header) => request.header(COOKIE, header),
            None => request,
        };
        let response = request.send()?.error_for_status()?;
        self.capture_cookies(&response);
        let json: Json = serde_json::from_str(&response.text()?)?;
        if !json["error"].is_null() {
            return Err(Error::Api(json));
        }
        Ok(json)
    }
    fn cookie_header(&self) -> Option<String> {
        let jar = self.cookies.borrow();
        let header = jar
            .iter()
            .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
            .collect::<Vec<_>>()
            .join("; ");
        if header.is_empty() {
            None
        } else {
            Some(header)
        }
    }
    fn capture_cookies(&self, response: &Response) {
        let mut jar = self.cookies.borrow_mut();
        for value in response.headers().get_all(SET_COOKIE) {
            if let Ok(value) = value.to_str() {
                if let Ok(cookie) = Cookie::parse(value.to_owned()) {
                    jar.add(cookie);
                }
            }
        }
    }
}

pub struct RequestBuilder<'a> {
    mw: &'a Mediawiki,
    args: BTreeMap<String, String>,
}
impl<'a> RequestBuilder<'a> {
    pub fn arg(&mut self, key: &str, value: &str) {
        self.args.insert(key.to_owned(), value.to_owned());
    }
    pub fn get(&self) -> Result<Json, Error> {
        self.mw.send(&self.args, false)
    }
    pub fn post(&self) -> Result<Json, Error> {
        self.mw.send(&self.args, true)
    }
}

pub struct QueryBuilder<'a> {
    mw: &'a Mediawiki,
    key: String,
    args: BTreeMap<String, String>,
}
impl<'a> QueryBuilder<'a> {
    pub fn arg(&mut self, key: &str, value: &str) {
        self.args.insert(key.to_owned(), value.to_owned());
    }
}
impl<'a> IntoIterator for QueryBuilder<'a> {
    type Item = Result<Json, Error>;
    type IntoIter = Query<'a>;
    fn into_iter(self) -> Query<'a> {
        Query {
            mw: self.mw,
            key: self.key,
            args: self.args,
            batch: VecDeque::new(),
            cont: Continuation::Start,
        }
    }
}

enum Continuation {
    Start,
    Next(BTreeMap<String, String>),
    Done,
}

/// Iterator over every item of a list query. Fetches one batch at a time,
/// merging the response's `continue` object into the next request until the
/// API stops returning one. A failed fetch yields the error and ends the
/// iteration.
pub struct Query<'a> {
    mw: &'a Mediawiki,
    key: String,
    args: BTreeMap<String, String>,
    batch: VecDeque<Json>,
    cont: Continuation,
}
impl<'a> Iterator for Query<'a> {
    type Item = Result<Json, Error>;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.batch.pop_front() {
                return Some(Ok(item));
            }
            let extra = match mem::replace(&mut self.cont, Continuation::Done) {
                Continuation::Done => return None,
                Continuation::Start => BTreeMap::new(),
                Continuation::Next(extra) => extra,
            };
            let mut args = self.args.clone();
            args.extend(extra);
            match self.mw.send(&args, false) {
                Ok(json) => {
                    if let Some(err) = self.ingest(json) {
                        return Some(Err(err));
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
impl<'a> Query<'a> {
    /// Folds one response into the iterator state. A batch that lacks the
    /// named list ends the iteration even when the response carries a
    /// `continue` object, so the error is the last thing yielded.
    fn ingest(&mut self, json: Json) -> Option<Error> {
        let cont = continue_args(&json);
        match batch_items(&json, &self.key) {
            Some(items) => {
                self.batch.extend(items);
                self.cont = match cont {
                    Some(next) => Continuation::Next(next),
                    None => Continuation::Done,
                };
                None
            }
            None => {
                self.cont = Continuation::Done;
                Some(Error::Api(json))
            }
        }
    }
}

/// Extracts the `continue` object as request args for the next batch.
fn continue_args(json: &Json) -> Option<BTreeMap<String, String>> {
    let cont = json.get("continue")?.as_object()?;
    let args = cont
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Json::String(value) => value.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect();
    Some(args)
}

fn batch_items(json: &Json, key: &str) -> Option<Vec<Json>> {
    Some(json.get("query")?.get(key)?.as_array()?.clone())
}
