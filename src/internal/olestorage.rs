use crate::internal::streamname::{self, StreamKind};
use log::{debug, warn};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

// ========================================================================= //

const CABINET_SIGNATURE: &[u8; 4] = b"MSCF";

// ========================================================================= //

/// A stream read directly out of the package's compound file.
#[derive(Clone, Debug)]
pub struct OleStream {
    name: String,
    data: Vec<u8>,
}

impl OleStream {
    /// Returns the decoded stream name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stream contents.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the stream, returning its contents.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

// ========================================================================= //

/// Looks for an embedded cabinet by walking the raw streams at the root of
/// the package's compound file.
///
/// A stream whose decoded name equals `cabinet_name` wins.  Failing that,
/// the first stream that starts with a cabinet signature is used; if there
/// is more than one such stream, the choice is ambiguous and a warning is
/// logged.
pub fn find_cabinet_stream<F: Read + Seek>(
    inner: F,
    cabinet_name: &str,
) -> io::Result<Option<OleStream>> {
    let mut comp = cfb::CompoundFile::open(inner)?;
    let entries: Vec<(String, PathBuf)> = comp
        .read_root_storage()
        .filter(cfb::Entry::is_stream)
        .filter_map(|entry| match streamname::decode(entry.name()) {
            (name, StreamKind::Data) => Some((name, entry.path().to_path_buf())),
            _ => None,
        })
        .collect();

    if let Some((name, path)) =
        entries.iter().find(|(name, _)| name == cabinet_name)
    {
        debug!("Found stream {name:?} by walking the compound file");
        return read_stream(&mut comp, name, path).map(Some);
    }

    let mut candidates = Vec::new();
    for (name, path) in entries.iter() {
        let mut stream = comp.open_stream(path)?;
        let mut signature = [0u8; 4];
        if stream.read_exact(&mut signature).is_ok()
            && &signature == CABINET_SIGNATURE
        {
            candidates.push((name, path));
        }
    }
    if candidates.len() != 1 {
        warn!(
            "Expected exactly one cabinet stream in the package while \
             looking for {cabinet_name:?}, but found {}",
            candidates.len()
        );
    }
    match candidates.first() {
        Some(&(name, path)) => {
            warn!("Using stream {name:?} in place of {cabinet_name:?}");
            read_stream(&mut comp, name, path).map(Some)
        }
        None => Ok(None),
    }
}

fn read_stream<F: Read + Seek>(
    comp: &mut cfb::CompoundFile<F>,
    name: &str,
    path: &Path,
) -> io::Result<OleStream> {
    let mut stream = comp.open_stream(path)?;
    let mut data = Vec::with_capacity(stream.len() as usize);
    stream.read_to_end(&mut data)?;
    Ok(OleStream { name: name.to_string(), data })
}

// ========================================================================= //

#[cfg(test)]
mod tests {
    use super::find_cabinet_stream;
    use std::io::{Cursor, Write};

    fn compound_file(streams: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
        let mut comp = cfb::CompoundFile::create(Cursor::new(Vec::new()))
            .expect("create");
        for &(name, data) in streams {
            let mut stream =
                comp.create_stream(format!("/{name}")).expect("stream");
            stream.write_all(data).expect("write");
        }
        comp.flush().expect("flush");
        let mut cursor = comp.into_inner();
        cursor.set_position(0);
        cursor
    }

    #[test]
    fn find_by_name() {
        let cursor = compound_file(&[
            ("first.cab", b"MSCF first"),
            ("second.cab", b"MSCF second"),
        ]);
        let stream = find_cabinet_stream(cursor, "second.cab")
            .expect("walk")
            .expect("found");
        assert_eq!(stream.name(), "second.cab");
        assert_eq!(stream.data(), b"MSCF second");
    }

    #[test]
    fn fall_back_to_cabinet_signature() {
        let cursor = compound_file(&[
            ("Icon", b"not a cabinet"),
            ("data", b"MSCF payload"),
        ]);
        let stream = find_cabinet_stream(cursor, "product.cab")
            .expect("walk")
            .expect("found");
        assert_eq!(stream.name(), "data");
        assert_eq!(stream.into_data(), b"MSCF payload".to_vec());
    }

    #[test]
    fn nothing_found() {
        let cursor = compound_file(&[("Icon", b"GIF89a")]);
        let found = find_cabinet_stream(cursor, "product.cab").expect("walk");
        assert!(found.is_none());
    }
}

// ========================================================================= //
