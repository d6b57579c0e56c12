use mwdump::{dump, fetch, images::Images, pages::Pages, store::Store, Error, Mediawiki};

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

    for title in &titles {
        fetch::page(&store, title, || mw.parse_page(title))?;
        fetch::revisions(&store, title, || mw.query_revisions(title))?;
    }

    for image in mw.query_all_images() {
        let image = image?;
        match image["url"].as_str() {
            Some(url) => fetch::image(&store, url, || mw.download_image(url))?,
            None => return Err(Error::Api(image)),
        }
    }

    dump::write(&store, "combined_dump.xml")?;
    println!("Wrote combined_dump.xml");
    Ok(())
}
