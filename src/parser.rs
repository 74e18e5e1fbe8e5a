use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::track_types::TrackPoint;

const TRACK_POINT: &str = "trkpt";
const ROUTE_POINT: &str = "rtept";

/// Extract the ordered path of a GPX document.
///
/// Track points win; route points are used only when the document has no
/// usable track point. Points with a missing or invalid position are
/// dropped.
///
/// Every point element is read on its own, so broken markup elsewhere in
/// the document (a stray `&` in the metadata, a mangled comment between
/// points) costs at most the element it sits in.
pub fn extract_points(xml: &str) -> Vec<TrackPoint> {
    let track_points = points_of_kind(xml, TRACK_POINT);
    if track_points.is_empty() {
        points_of_kind(xml, ROUTE_POINT)
    } else {
        track_points
    }
}

fn points_of_kind(xml: &str, local_name: &str) -> Vec<TrackPoint> {
    let mut points = Vec::new();
    let mut dropped = 0usize;
    let mut cursor = 0;

    while let Some(element) = find_element(xml, cursor, local_name) {
        let end = element_end(xml, &element, local_name);
        match parse_point(&xml[element.open..end]) {
            Some(pt) => points.push(pt),
            None => dropped += 1,
        }
        cursor = end;
    }

    if dropped > 0 {
        tracing::trace!(dropped, element = local_name, "skipped points with invalid coordinates");
    }
    points
}

/// Start tag of a point element, possibly namespace prefixed (`<gpx:trkpt`).
struct ElementStart {
    /// Byte offset of the `<`.
    open: usize,
    /// Byte offset just past the (qualified) element name.
    name_end: usize,
}

fn find_element(xml: &str, from: usize, local_name: &str) -> Option<ElementStart> {
    let bytes = xml.as_bytes();
    let mut search = from;

    while let Some(rel) = xml[search..].find(local_name) {
        let at = search + rel;
        let name_end = at + local_name.len();
        search = name_end;

        if !matches!(
            bytes.get(name_end),
            Some(b' ' | b'\t' | b'\r' | b'\n' | b'>' | b'/')
        ) {
            continue;
        }

        let mut open = at;
        if open > 0 && bytes[open - 1] == b':' {
            open -= 1;
            while open > 0 && is_name_byte(bytes[open - 1]) {
                open -= 1;
            }
        }
        if open > from && bytes[open - 1] == b'<' {
            return Some(ElementStart {
                open: open - 1,
                name_end,
            });
        }
    }

    None
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.')
}

/// End of the element that starts at `element`: the self-closing `/>`, its
/// closing tag, or the next point element when the closing tag is missing.
fn element_end(xml: &str, element: &ElementStart, local_name: &str) -> usize {
    let Some(rel) = xml[element.name_end..].find('>') else {
        return xml.len();
    };
    let tag_end = element.name_end + rel + 1;
    if xml.as_bytes()[tag_end - 2] == b'/' {
        return tag_end;
    }

    let qualified = &xml[element.open + 1..element.name_end];
    let close = format!("</{qualified}");
    let close_end = xml[tag_end..].find(&close).map(|rel| {
        let after_name = tag_end + rel + close.len();
        xml[after_name..]
            .find('>')
            .map_or(xml.len(), |gt| after_name + gt + 1)
    });
    let next_start = find_element(xml, tag_end, local_name).map(|next| next.open);

    match (close_end, next_start) {
        (Some(close), Some(next)) => close.min(next),
        (Some(close), None) => close,
        (None, Some(next)) => next,
        (None, None) => xml.len(),
    }
}

/// Parse lat/lon attributes from a point element's start tag.
/// Returns `None` when either is missing, not a finite number, or out of range.
fn parse_lat_lon(e: &BytesStart<'_>) -> Option<(f64, f64)> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr in e.attributes().flatten() {
        let Ok(val) = std::str::from_utf8(&attr.value) else {
            continue;
        };
        match attr.key.local_name().as_ref() {
            b"lat" => lat = parse_coordinate(val, 90.0),
            b"lon" => lon = parse_coordinate(val, 180.0),
            _ => {}
        }
    }

    Some((lat?, lon?))
}

fn parse_coordinate(raw: &str, limit: f64) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() <= limit)
}

/// Parse one point element (trkpt, rtept) from its own slice of the document.
/// The first `<ele>` found inside it, at any depth, is its elevation; markup
/// errors among the children are stepped over.
fn parse_point(fragment: &str) -> Option<TrackPoint> {
    let mut reader = Reader::from_str(fragment);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_dangling_amp = true;

    let (lat, lon) = match reader.read_event() {
        Ok(Event::Start(e)) => parse_lat_lon(&e)?,
        Ok(Event::Empty(e)) => return parse_lat_lon(&e).map(|(lat, lon)| TrackPoint::new(lat, lon)),
        _ => return None,
    };

    let mut point = TrackPoint::new(lat, lon);

    loop {
        let before = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"ele" => {
                if let Ok(text) = reader.read_text(e.name()) {
                    point.ele = text.trim().parse::<f64>().ok().filter(|v| v.is_finite());
                }
                break;
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                tracing::trace!(%err, "malformed markup inside point");
                if reader.buffer_position() == before {
                    break;
                }
            }
            _ => {}
        }
    }

    Some(point)
}
