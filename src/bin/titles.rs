use mwdump::{pages::Pages, store::Store, Error, Mediawiki};

fn main() -> Result<(), Error> {
    let mw = Mediawiki::from_path_or_default("mwdump.json")?;
    let store = Store::open(".")?;
    let mut titles = Vec::new();
    for page in mw.query_all_pages() {
        let page = page?;
        match page["title"].as_str() {
            Some(title) => titles.push(title.to_owned()),
            None => return Err(Error::Api(page)),
        }
    }
    store.write_titles(&titles)?;
    println!("Wrote {} titles to titles.txt", titles.len());
    Ok(())
}
