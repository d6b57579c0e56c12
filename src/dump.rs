//! Assembles every persisted page, revision set, and image into one
//! `combined_dump.xml`. The format is this tool's own: each section holds the
//! raw JSON payloads as escaped text, it is not MediaWiki's export schema.

use crate::{store::Store, Error, Json};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::{fs::File, io::BufWriter, io::Write as _, path::Path};

pub fn write<P: AsRef<Path>>(store: &Store, path: P) -> Result<(), Error> {
    let file = BufWriter::new(File::create(path)?);
    let mut writer = Writer::new_with_indent(file, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("MediaWikiDump")))?;

    writer.write_event(Event::Start(BytesStart::new("Pages")))?;
    for (title, raw) in store.pages()? {
        write_entry(&mut writer, "Page", &title, &raw)?;
    }
    writer.write_event(Event::End(BytesEnd::new("Pages")))?;

    writer.write_event(Event::Start(BytesStart::new("Revisions")))?;
    for (title, raw) in store.revisions()? {
        write_entry(&mut writer, "Revision", &title, &raw)?;
    }
    writer.write_event(Event::End(BytesEnd::new("Revisions")))?;

    writer.write_event(Event::Start(BytesStart::new("Images")))?;
    for name in store.images()? {
        let mut image = BytesStart::new("Image");
        image.push_attribute(("name", name.as_str()));
        writer.write_event(Event::Start(image))?;
        writer.write_event(Event::Text(BytesText::new(&format!("/images/{}", name))))?;
        writer.write_event(Event::End(BytesEnd::new("Image")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Images")))?;

    writer.write_event(Event::End(BytesEnd::new("MediaWikiDump")))?;
    writer.into_inner().flush()?;
    Ok(())
}

fn write_entry<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &'static str,
    title: &str,
    raw: &str,
) -> Result<(), Error> {
    // Re-serialize compactly; the files on disk are pretty-printed.
    let json: Json = serde_json::from_str(raw)?;
    let mut start = BytesStart::new(tag);
    start.push_attribute(("title", title));
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Start(BytesStart::new("Content")))?;
    writer.write_event(Event::Text(BytesText::new(&json.to_string())))?;
    writer.write_event(Event::End(BytesEnd::new("Content")))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::write;
    use crate::store::Store;
    use crate::Json;
    use quick_xml::events::Event;
    use quick_xml::Reader;
    use serde_json::json;

    fn count(xml: &str, tag: &str) -> usize {
        let mut reader = Reader::from_str(xml);
        let mut count = 0;
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.name().as_ref() == tag.as_bytes() => count += 1,
                Event::Eof => break,
                _ => {}
            }
        }
        count
    }

    fn first_content(xml: &str) -> String {
        let mut reader = Reader::from_str(xml);
        let mut inside = false;
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.name().as_ref() == b"Content" => inside = true,
                Event::Text(e) if inside => return e.unescape().unwrap().into_owned(),
                Event::Eof => panic!("no Content element"),
                _ => {}
            }
        }
    }

    #[test]
    fn section_counts_match_persisted_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.write_page("AI", &json!({"parse": {"title": "AI"}})).unwrap();
        store
            .write_page("Atmospherics", &json!({"parse": {"title": "Atmospherics"}}))
            .unwrap();
        store.write_revisions("AI", &json!({"query": {}})).unwrap();
        store.write_image("toolbox.png", b"png").unwrap();
        store.write_image("wrench.png", b"png").unwrap();
        store.write_image("crowbar.png", b"png").unwrap();
        let out = dir.path().join("combined_dump.xml");
        write(&store, &out).unwrap();
        let xml = std::fs::read_to_string(out).unwrap();
        assert_eq!(count(&xml, "Page"), 2);
        assert_eq!(count(&xml, "Revision"), 1);
        assert_eq!(count(&xml, "Image"), 3);
        assert_eq!(count(&xml, "MediaWikiDump"), 1);
    }

    #[test]
    fn json_payload_survives_xml_escaping() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let payload = json!({"parse": {"text": "<b>5 &amp; 6</b> \"quoted\""}});
        store.write_page("Escapes", &payload).unwrap();
        let out = dir.path().join("combined_dump.xml");
        write(&store, &out).unwrap();
        let xml = std::fs::read_to_string(out).unwrap();
        let roundtrip: Json = serde_json::from_str(&first_content(&xml)).unwrap();
        assert_eq!(roundtrip, payload);
    }

    #[test]
    fn empty_store_still_produces_all_sections() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let out = dir.path().join("combined_dump.xml");
        write(&store, &out).unwrap();
        let xml = std::fs::read_to_string(out).unwrap();
        assert_eq!(count(&xml, "Pages"), 1);
        assert_eq!(count(&xml, "Revisions"), 1);
        assert_eq!(count(&xml, "Images"), 1);
        assert_eq!(count(&xml, "Page"), 0);
        assert_eq!(count(&xml, "Revision"), 0);
        assert_eq!(count(&xml, "Image"), 0);
    }
}
