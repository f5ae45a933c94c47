use std::io::Write;

use shutter::Photo;

use crate::error::GalleryError;

/// Write one photo line to `writer`.
///
/// TSV columns: id, author, likes, color, url, caption. Missing values are
/// written as `-`. JSON mode writes the photo as one JSON object per line.
pub fn write_photo<W: Write>(
    photo: &Photo,
    json_mode: bool,
    buf: &mut String,
    writer: &mut W,
) -> Result<(), GalleryError> {
    buf.clear();

    if json_mode {
        buf.push_str(&serde_json::to_string(photo)?);
    } else {
        buf.push_str(&photo.id);
        buf.push('\t');
        push_or_dash(buf, photo.author.as_ref().map(|a| a.username.as_str()));
        buf.push('\t');
        match photo.likes {
            Some(n) => buf.push_str(&n.to_string()),
            None => buf.push('-'),
        }
        buf.push('\t');
        push_or_dash(buf, photo.color.as_deref());
        buf.push('\t');
        push_or_dash(buf, photo.urls.best());
        buf.push('\t');
        // Captions are free text; keep the line tab/newline free.
        push_or_dash(buf, photo.caption().map(str::trim));
        sanitize_tail(buf);
    }

    buf.push('\n');
    writer.write_all(buf.as_bytes())?;
    writer.flush()?;

    Ok(())
}

fn push_or_dash(buf: &mut String, value: Option<&str>) {
    match value {
        Some(v) if !v.is_empty() => buf.push_str(v),
        _ => buf.push('-'),
    }
}

/// Replace tabs and newlines inside the last column with spaces.
fn sanitize_tail(buf: &mut String) {
    let start = buf.rfind('\t').map(|i| i + 1).unwrap_or(0);
    let tail: String = buf[start..]
        .chars()
        .map(|c| if c == '\t' || c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    buf.truncate(start);
    buf.push_str(&tail);
}
