use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use encoding_rs::WINDOWS_1252;
use log::{debug, warn};
use std::io::{self, Read, Seek, SeekFrom, Write};

// ========================================================================= //

const SIGNATURE: u32 = 0x4643534d; // "MSCF" stored little-endian
const VERSION_MINOR: u8 = 3;
const VERSION_MAJOR: u8 = 1;

const FLAG_PREV_CABINET: u16 = 0x1;
const FLAG_NEXT_CABINET: u16 = 0x2;
const FLAG_RESERVE_PRESENT: u16 = 0x4;

const FOLDER_CONTINUED_FROM_PREV: u16 = 0xfffd;
const FOLDER_CONTINUED_TO_NEXT: u16 = 0xfffe;
const FOLDER_CONTINUED_PREV_AND_NEXT: u16 = 0xffff;

const MAX_STRING_LEN: usize = 256;

const HEADER_SIZE: u32 = 36;
const FOLDER_ENTRY_SIZE: u32 = 8;
const FILE_ENTRY_FIXED_SIZE: u32 = 16;
const DATA_BLOCK_HEADER_SIZE: u32 = 8;

// ========================================================================= //

/// The cabinet named in a header's previous/next link.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkedCabinet {
    cabinet: String,
    disk: String,
}

impl LinkedCabinet {
    /// Returns the file name of the linked cabinet.
    pub fn cabinet(&self) -> &str {
        &self.cabinet
    }

    /// Returns the human-readable label of the disk holding it.
    pub fn disk(&self) -> &str {
        &self.disk
    }
}

/// The fixed header (CFHEADER) at the start of a cabinet file.
#[derive(Clone, Debug)]
pub struct CabinetHeader {
    total_size: u32,
    files_offset: u32,
    num_folders: u16,
    num_files: u16,
    flags: u16,
    set_id: u16,
    set_index: u16,
    folder_reserve_size: u8,
    data_reserve_size: u8,
    prev: Option<LinkedCabinet>,
    next: Option<LinkedCabinet>,
}

impl CabinetHeader {
    /// Reads a header from the start of a cabinet.
    pub fn read<R: Read>(reader: &mut R) -> io::Result<CabinetHeader> {
        let signature = reader.read_u32::<LittleEndian>()?;
        if signature != SIGNATURE {
            invalid_data!("Not a cabinet file (invalid file signature)");
        }
        let _reserved1 = reader.read_u32::<LittleEndian>()?;
        let total_size = reader.read_u32::<LittleEndian>()?;
        let _reserved2 = reader.read_u32::<LittleEndian>()?;
        let files_offset = reader.read_u32::<LittleEndian>()?;
        let _reserved3 = reader.read_u32::<LittleEndian>()?;
        let minor_version = reader.read_u8()?;
        let major_version = reader.read_u8()?;
        if major_version > VERSION_MAJOR
            || major_version == VERSION_MAJOR && minor_version > VERSION_MINOR
        {
            invalid_data!(
                "Version {}.{} cabinet files are not supported",
                major_version,
                minor_version
            );
        }
        let num_folders = reader.read_u16::<LittleEndian>()?;
        let num_files = reader.read_u16::<LittleEndian>()?;
        let flags = reader.read_u16::<LittleEndian>()?;
        let set_id = reader.read_u16::<LittleEndian>()?;
        let set_index = reader.read_u16::<LittleEndian>()?;
        let mut folder_reserve_size = 0;
        let mut data_reserve_size = 0;
        if (flags & FLAG_RESERVE_PRESENT) != 0 {
            let header_reserve_size = reader.read_u16::<LittleEndian>()?;
            folder_reserve_size = reader.read_u8()?;
            data_reserve_size = reader.read_u8()?;
            skip(reader, header_reserve_size as u64)?;
        }
        let prev = if (flags & FLAG_PREV_CABINET) != 0 {
            Some(read_link(reader)?)
        } else {
            None
        };
        let next = if (flags & FLAG_NEXT_CABINET) != 0 {
            Some(read_link(reader)?)
        } else {
            None
        };
        Ok(CabinetHeader {
            total_size,
            files_offset,
            num_folders,
            num_files,
            flags,
            set_id,
            set_index,
            folder_reserve_size,
            data_reserve_size,
            prev,
            next,
        })
    }

    /// Returns the size of the cabinet file, in bytes, as its header states.
    pub fn total_size(&self) -> u32 {
        self.total_size
    }

    /// Returns the identifier shared by all cabinets of a set.
    pub fn set_id(&self) -> u16 {
        self.set_id
    }

    /// Returns this cabinet's zero-based position within its set.
    pub fn set_index(&self) -> u16 {
        self.set_index
    }

    /// Returns the cabinet that precedes this one in its set, if any.
    pub fn prev(&self) -> Option<&LinkedCabinet> {
        self.prev.as_ref()
    }

    /// Returns the cabinet that follows this one in its set, if any.
    pub fn next(&self) -> Option<&LinkedCabinet> {
        self.next.as_ref()
    }

    /// Returns true if this cabinet is linked to another one.
    pub fn is_part_of_set(&self) -> bool {
        (self.flags & (FLAG_PREV_CABINET | FLAG_NEXT_CABINET)) != 0
    }
}

fn read_link<R: Read>(reader: &mut R) -> io::Result<LinkedCabinet> {
    let cabinet = read_null_terminated(reader)?;
    let disk = read_null_terminated(reader)?;
    Ok(LinkedCabinet {
        cabinet: WINDOWS_1252.decode(&cabinet).0.into_owned(),
        disk: WINDOWS_1252.decode(&disk).0.into_owned(),
    })
}

fn read_null_terminated<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    loop {
        let byte = reader.read_u8()?;
        if byte == 0 {
            return Ok(bytes);
        }
        if bytes.len() == MAX_STRING_LEN {
            invalid_data!(
                "Cabinet string is longer than {} bytes",
                MAX_STRING_LEN
            );
        }
        bytes.push(byte);
    }
}

fn skip<R: Read>(reader: &mut R, count: u64) -> io::Result<()> {
    let skipped = io::copy(&mut reader.take(count), &mut io::sink())?;
    if skipped != count {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    }
    Ok(())
}

// ========================================================================= //

/// One group of linked cabinets, as indices into the list that was linked.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CabinetChain {
    members: Vec<usize>,
    missing: Option<String>,
}

impl CabinetChain {
    /// Returns the member indices, first part first.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Returns the name of a linked cabinet that could not be found, if the
    /// chain is incomplete.
    pub fn missing(&self) -> Option<&str> {
        self.missing.as_deref()
    }

    /// Returns true if the chain has a single member that links to nothing.
    pub fn is_standalone(&self) -> bool {
        self.members.len() == 1 && self.missing.is_none()
    }
}

/// Groups cabinets into chains by following their previous/next links.
/// Links are matched against the cabinet names ignoring ASCII case.  Each cabinet
/// appears in exactly one chain; chains are ordered by their earliest
/// member in `cabinets`.
pub fn link_chains<S: AsRef<str>>(
    cabinets: &[(S, &CabinetHeader)],
) -> Vec<CabinetChain> {
    let find = |wanted: &str| {
        cabinets
            .iter()
            .position(|(name, _)| name.as_ref().eq_ignore_ascii_case(wanted))
    };
    let mut used = vec![false; cabinets.len()];
    let mut chains = Vec::new();
    for start in 0..cabinets.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut members = vec![start];
        let mut missing = None;
        let mut current = start;
        while let Some(link) = cabinets[current].1.prev() {
            match find(link.cabinet()) {
                Some(index) if !used[index] => {
                    used[index] = true;
                    members.insert(0, index);
                    current = index;
                }
                Some(_) => {
                    warn!(
                        "Cabinet {:?} links back to {:?}, which is already \
                         part of a set",
                        cabinets[current].0.as_ref(),
                        link.cabinet()
                    );
                    break;
                }
                None => {
                    missing = Some(link.cabinet().to_string());
                    break;
                }
            }
        }
        current = start;
        while let Some(link) = cabinets[current].1.next() {
            match find(link.cabinet()) {
                Some(index) if !used[index] => {
                    used[index] = true;
                    members.push(index);
                    current = index;
                }
                Some(_) => {
                    warn!(
                        "Cabinet {:?} links forward to {:?}, which is \
                         already part of a set",
                        cabinets[current].0.as_ref(),
                        link.cabinet()
                    );
                    break;
                }
                None => {
                    missing.get_or_insert_with(|| link.cabinet().to_string());
                    break;
                }
            }
        }
        chains.push(CabinetChain { members, missing });
    }
    chains
}

// ========================================================================= //

struct PartFolder {
    first_block_offset: u32,
    num_blocks: u16,
    compression: u16,
}

struct PartFile {
    size: u32,
    offset: u32,
    folder: u16,
    date: u16,
    time: u16,
    attributes: u16,
    name: Vec<u8>,
}

struct Part {
    header: CabinetHeader,
    folders: Vec<PartFolder>,
    files: Vec<PartFile>,
}

impl Part {
    fn read<R: Read + Seek>(reader: &mut R) -> io::Result<Part> {
        reader.seek(SeekFrom::Start(0))?;
        let header = CabinetHeader::read(reader)?;
        let mut folders = Vec::with_capacity(header.num_folders as usize);
        for _ in 0..header.num_folders {
            let first_block_offset = reader.read_u32::<LittleEndian>()?;
            let num_blocks = reader.read_u16::<LittleEndian>()?;
            let compression = reader.read_u16::<LittleEndian>()?;
            skip(reader, header.folder_reserve_size as u64)?;
            folders.push(PartFolder {
                first_block_offset,
                num_blocks,
                compression,
            });
        }
        reader.seek(SeekFrom::Start(header.files_offset as u64))?;
        let mut files = Vec::with_capacity(header.num_files as usize);
        for _ in 0..header.num_files {
            let size = reader.read_u32::<LittleEndian>()?;
            let offset = reader.read_u32::<LittleEndian>()?;
            let folder = reader.read_u16::<LittleEndian>()?;
            let date = reader.read_u16::<LittleEndian>()?;
            let time = reader.read_u16::<LittleEndian>()?;
            let attributes = reader.read_u16::<LittleEndian>()?;
            let name = read_null_terminated(reader)?;
            files.push(PartFile {
                size,
                offset,
                folder,
                date,
                time,
                attributes,
                name,
            });
        }
        Ok(Part { header, folders, files })
    }

    fn continues_to_next(&self) -> bool {
        self.files.iter().any(|file| {
            file.folder == FOLDER_CONTINUED_TO_NEXT
                || file.folder == FOLDER_CONTINUED_PREV_AND_NEXT
        })
    }

    fn continues_from_prev(&self) -> bool {
        self.files.iter().any(|file| {
            file.folder == FOLDER_CONTINUED_FROM_PREV
                || file.folder == FOLDER_CONTINUED_PREV_AND_NEXT
        })
    }
}

// ========================================================================= //

/// Where one piece of a data block's payload lives.
struct Segment {
    part: usize,
    offset: u64,
    len: u16,
}

struct MergedBlock {
    segments: Vec<Segment>,
    uncompressed_size: u16,
}

impl MergedBlock {
    fn compressed_size(&self) -> u32 {
        self.segments.iter().map(|segment| segment.len as u32).sum()
    }
}

struct MergedFolder {
    compression: u16,
    blocks: Vec<MergedBlock>,
}

impl MergedFolder {
    fn append_block(&mut self, segment: Segment, uncompressed_size: u16) {
        if let Some(last) = self.blocks.last_mut() {
            // A zero uncompressed size marks a block split across parts.
            if last.uncompressed_size == 0 {
                last.segments.push(segment);
                last.uncompressed_size = uncompressed_size;
                return;
            }
        }
        self.blocks
            .push(MergedBlock { segments: vec![segment], uncompressed_size });
    }
}

fn read_blocks<R: Read + Seek>(
    reader: &mut R,
    part_index: usize,
    folder: &PartFolder,
    data_reserve_size: u8,
    into: &mut MergedFolder,
) -> io::Result<()> {
    let mut offset = folder.first_block_offset as u64;
    for _ in 0..folder.num_blocks {
        reader.seek(SeekFrom::Start(offset + 4))?;
        let compressed_size = reader.read_u16::<LittleEndian>()?;
        let uncompressed_size = reader.read_u16::<LittleEndian>()?;
        let data_offset = offset
            + DATA_BLOCK_HEADER_SIZE as u64
            + data_reserve_size as u64;
        into.append_block(
            Segment { part: part_index, offset: data_offset, len: compressed_size },
            uncompressed_size,
        );
        offset = data_offset + compressed_size as u64;
    }
    Ok(())
}

// ========================================================================= //

/// Splices the parts of a spanned cabinet set, first part first, into one
/// standalone cabinet written to `writer`.
///
/// Compressed data is copied verbatim; a folder that continues across a
/// part boundary becomes one folder, and a data block split across parts is
/// joined back together.  The result carries no reserve areas and no data
/// checksums.
pub fn merge_cabinets<R: Read + Seek, W: Write>(
    parts: &mut [R],
    writer: &mut W,
) -> io::Result<()> {
    if parts.is_empty() {
        invalid_input!("Cannot merge an empty cabinet set");
    }
    let mut headers = Vec::with_capacity(parts.len());
    let mut folders: Vec<MergedFolder> = Vec::new();
    let mut files: Vec<(usize, PartFile)> = Vec::new();
    let mut previous_continues = false;
    for (part_index, reader) in parts.iter_mut().enumerate() {
        let part = Part::read(reader)?;
        debug!(
            "Merging cabinet part {} (set {}, index {}, {} folders, {} files)",
            part_index,
            part.header.set_id,
            part.header.set_index,
            part.folders.len(),
            part.files.len()
        );
        let split_block = folders
            .last()
            .and_then(|folder| folder.blocks.last())
            .map_or(false, |block| block.uncompressed_size == 0);
        let joins_previous = part_index > 0
            && !part.folders.is_empty()
            && (previous_continues || part.continues_from_prev() || split_block);
        let mut folder_map = Vec::with_capacity(part.folders.len());
        for (index, folder) in part.folders.iter().enumerate() {
            if index == 0 && joins_previous {
                let Some(last) = folders.last_mut() else {
                    invalid_data!(
                        "Cabinet part {} continues a folder, but no earlier \
                         part has one",
                        part_index
                    );
                };
                if last.compression != folder.compression {
                    invalid_data!(
                        "Cabinet part {} continues a folder with a different \
                         compression type",
                        part_index
                    );
                }
                read_blocks(
                    reader,
                    part_index,
                    folder,
                    part.header.data_reserve_size,
                    last,
                )?;
            } else {
                let mut merged = MergedFolder {
                    compression: folder.compression,
                    blocks: Vec::with_capacity(folder.num_blocks as usize),
                };
                read_blocks(
                    reader,
                    part_index,
                    folder,
                    part.header.data_reserve_size,
                    &mut merged,
                )?;
                folders.push(merged);
            }
            folder_map.push(folders.len() - 1);
        }
        previous_continues = part.continues_to_next();
        for file in part.files {
            let merged_folder = match file.folder {
                FOLDER_CONTINUED_FROM_PREV | FOLDER_CONTINUED_PREV_AND_NEXT => {
                    // Already listed by the part the file started in.
                    continue;
                }
                FOLDER_CONTINUED_TO_NEXT => match folder_map.last() {
                    Some(&index) => index,
                    None => invalid_data!(
                        "Cabinet part {} has a continued file but no folders",
                        part_index
                    ),
                },
                index => match folder_map.get(index as usize) {
                    Some(&index) => index,
                    None => invalid_data!(
                        "File entry folder index out of bounds in cabinet \
                         part {}",
                        part_index
                    ),
                },
            };
            files.push((merged_folder, file));
        }
        headers.push(part.header);
    }
    if folders
        .last()
        .and_then(|folder| folder.blocks.last())
        .map_or(false, |block| block.uncompressed_size == 0)
    {
        invalid_data!("Cabinet set ends in the middle of a data block");
    }
    if headers.last().map_or(false, |header| header.next.is_some()) {
        warn!("Last cabinet of the set still links to a next cabinet");
    }
    files.sort_by_key(|&(folder, _)| folder);
    let set_id = headers[0].set_id;
    write_merged(parts, &folders, &files, set_id, writer)
}

fn write_merged<R: Read + Seek, W: Write>(
    parts: &mut [R],
    folders: &[MergedFolder],
    files: &[(usize, PartFile)],
    set_id: u16,
    writer: &mut W,
) -> io::Result<()> {
    if folders.len() > u16::MAX as usize {
        invalid_input!("Merged cabinet would have too many folders");
    }
    if files.len() > u16::MAX as usize {
        invalid_input!("Merged cabinet would have too many files");
    }
    let files_offset =
        HEADER_SIZE as u64 + FOLDER_ENTRY_SIZE as u64 * folders.len() as u64;
    let files_size: u64 = files
        .iter()
        .map(|(_, file)| {
            FILE_ENTRY_FIXED_SIZE as u64 + file.name.len() as u64 + 1
        })
        .sum();
    let mut folder_offsets = Vec::with_capacity(folders.len());
    let mut offset = files_offset + files_size;
    for folder in folders {
        if folder.blocks.len() > u16::MAX as usize {
            invalid_input!("Merged folder would have too many data blocks");
        }
        folder_offsets.push(offset);
        for block in folder.blocks.iter() {
            if block.compressed_size() > u16::MAX as u32 {
                invalid_data!("Joined data block is too large");
            }
            offset += DATA_BLOCK_HEADER_SIZE as u64
                + block.compressed_size() as u64;
        }
    }
    let total_size = offset;
    if total_size > u32::MAX as u64 {
        invalid_input!("Merged cabinet would be too large");
    }

    writer.write_u32::<LittleEndian>(SIGNATURE)?;
    writer.write_u32::<LittleEndian>(0)?;
    writer.write_u32::<LittleEndian>(total_size as u32)?;
    writer.write_u32::<LittleEndian>(0)?;
    writer.write_u32::<LittleEndian>(files_offset as u32)?;
    writer.write_u32::<LittleEndian>(0)?;
    writer.write_u8(VERSION_MINOR)?;
    writer.write_u8(VERSION_MAJOR)?;
    writer.write_u16::<LittleEndian>(folders.len() as u16)?;
    writer.write_u16::<LittleEndian>(files.len() as u16)?;
    writer.write_u16::<LittleEndian>(0)?;
    writer.write_u16::<LittleEndian>(set_id)?;
    writer.write_u16::<LittleEndian>(0)?;
    for (folder, &offset) in folders.iter().zip(folder_offsets.iter()) {
        writer.write_u32::<LittleEndian>(offset as u32)?;
        writer.write_u16::<LittleEndian>(folder.blocks.len() as u16)?;
        writer.write_u16::<LittleEndian>(folder.compression)?;
    }
    for (folder, file) in files {
        writer.write_u32::<LittleEndian>(file.size)?;
        writer.write_u32::<LittleEndian>(file.offset)?;
        writer.write_u16::<LittleEndian>(*folder as u16)?;
        writer.write_u16::<LittleEndian>(file.date)?;
        writer.write_u16::<LittleEndian>(file.time)?;
        writer.write_u16::<LittleEndian>(file.attributes)?;
        writer.write_all(&file.name)?;
        writer.write_u8(0)?;
    }
    for folder in folders {
        for block in folder.blocks.iter() {
            writer.write_u32::<LittleEndian>(0)?;
            writer.write_u16::<LittleEndian>(block.compressed_size() as u16)?;
            writer.write_u16::<LittleEndian>(block.uncompressed_size)?;
            for segment in block.segments.iter() {
                let reader = &mut parts[segment.part];
                reader.seek(SeekFrom::Start(segment.offset))?;
                let copied = io::copy(
                    &mut reader.by_ref().take(segment.len as u64),
                    writer,
                )?;
                if copied != segment.len as u64 {
                    invalid_data!(
                        "Data block in cabinet part {} is truncated",
                        segment.part
                    );
                }
            }
        }
    }
    writer.flush()
}

// ========================================================================= //

#[cfg(test)]
mod tests {
    use super::{link_chains, merge_cabinets, CabinetHeader};
    use byteorder::{LittleEndian, WriteBytesExt};
    use std::io::{Cursor, Read};

    struct RawFile<'a> {
        name: &'a str,
        size: u32,
        offset: u32,
        folder: u16,
    }

    /// Writes an uncompressed cabinet by hand.  Each folder is a list of
    /// `(payload, uncompressed size)` blocks.
    fn raw_cabinet(
        prev: Option<&str>,
        next: Option<&str>,
        set_index: u16,
        folders: &[Vec<(&str, u16)>],
        files: &[RawFile],
    ) -> Vec<u8> {
        let mut links = Vec::new();
        let mut flags = 0u16;
        if let Some(name) = prev {
            flags |= 0x1;
            links.extend_from_slice(name.as_bytes());
            links.extend_from_slice(b"\0Disk\0");
        }
        if let Some(name) = next {
            flags |= 0x2;
            links.extend_from_slice(name.as_bytes());
            links.extend_from_slice(b"\0Disk\0");
        }
        let files_offset = 36 + links.len() + 8 * folders.len();
        let files_size: usize =
            files.iter().map(|file| 16 + file.name.len() + 1).sum();
        let mut data_offset = files_offset + files_size;
        let mut cab = Vec::new();
        cab.extend_from_slice(b"MSCF");
        cab.write_u32::<LittleEndian>(0).unwrap();
        cab.write_u32::<LittleEndian>(0).unwrap();
        cab.write_u32::<LittleEndian>(0).unwrap();
        cab.write_u32::<LittleEndian>(files_offset as u32).unwrap();
        cab.write_u32::<LittleEndian>(0).unwrap();
        cab.extend_from_slice(&[3, 1]);
        cab.write_u16::<LittleEndian>(folders.len() as u16).unwrap();
        cab.write_u16::<LittleEndian>(files.len() as u16).unwrap();
        cab.write_u16::<LittleEndian>(flags).unwrap();
        cab.write_u16::<LittleEndian>(0x1234).unwrap();
        cab.write_u16::<LittleEndian>(set_index).unwrap();
        cab.extend_from_slice(&links);
        for blocks in folders {
            cab.write_u32::<LittleEndian>(data_offset as u32).unwrap();
            cab.write_u16::<LittleEndian>(blocks.len() as u16).unwrap();
            cab.write_u16::<LittleEndian>(0).unwrap();
            data_offset +=
                blocks.iter().map(|(data, _)| 8 + data.len()).sum::<usize>();
        }
        for file in files {
            cab.write_u32::<LittleEndian>(file.size).unwrap();
            cab.write_u32::<LittleEndian>(file.offset).unwrap();
            cab.write_u16::<LittleEndian>(file.folder).unwrap();
            cab.write_u16::<LittleEndian>(0x5021).unwrap();
            cab.write_u16::<LittleEndian>(0).unwrap();
            cab.write_u16::<LittleEndian>(0x20).unwrap();
            cab.extend_from_slice(file.name.as_bytes());
            cab.push(0);
        }
        for blocks in folders {
            for &(data, uncompressed_size) in blocks {
                cab.write_u32::<LittleEndian>(0).unwrap();
                cab.write_u16::<LittleEndian>(data.len() as u16).unwrap();
                cab.write_u16::<LittleEndian>(uncompressed_size).unwrap();
                cab.extend_from_slice(data.as_bytes());
            }
        }
        let total_size = cab.len() as u32;
        (&mut cab[8..12]).write_u32::<LittleEndian>(total_size).unwrap();
        cab
    }

    fn read_all(cab: Vec<u8>, name: &str) -> Vec<u8> {
        let mut cabinet = cab::Cabinet::new(Cursor::new(cab)).unwrap();
        let mut data = Vec::new();
        cabinet.read_file(name).unwrap().read_to_end(&mut data).unwrap();
        data
    }

    #[test]
    fn read_header_links() {
        let cab = raw_cabinet(Some("one.cab"), Some("three.cab"), 1, &[], &[]);
        let header = CabinetHeader::read(&mut Cursor::new(cab)).unwrap();
        assert!(header.is_part_of_set());
        assert_eq!(header.set_id(), 0x1234);
        assert_eq!(header.set_index(), 1);
        assert_eq!(header.prev().unwrap().cabinet(), "one.cab");
        assert_eq!(header.prev().unwrap().disk(), "Disk");
        assert_eq!(header.next().unwrap().cabinet(), "three.cab");
    }

    #[test]
    fn reject_non_cabinet() {
        let error =
            CabinetHeader::read(&mut Cursor::new(b"PK\x03\x04....".to_vec()))
                .unwrap_err();
        assert_eq!(error.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn link_chains_in_any_order() {
        let one = raw_cabinet(None, Some("TWO.CAB"), 0, &[], &[]);
        let two = raw_cabinet(Some("one.cab"), Some("three.cab"), 1, &[], &[]);
        let three = raw_cabinet(Some("two.cab"), None, 2, &[], &[]);
        let solo = raw_cabinet(None, None, 0, &[], &[]);
        let read = |cab: &Vec<u8>| {
            CabinetHeader::read(&mut Cursor::new(cab.clone())).unwrap()
        };
        let headers = [read(&three), read(&solo), read(&one), read(&two)];
        let cabinets = vec![
            ("three.cab", &headers[0]),
            ("solo.cab", &headers[1]),
            ("one.cab", &headers[2]),
            ("two.cab", &headers[3]),
        ];
        let chains = link_chains(&cabinets);
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[0].members(), &[2, 3, 0]);
        assert_eq!(chains[0].missing(), None);
        assert!(chains[1].is_standalone());
        assert_eq!(chains[1].members(), &[1]);
    }

    #[test]
    fn link_chain_with_missing_part() {
        let two = raw_cabinet(Some("one.cab"), None, 1, &[], &[]);
        let header = CabinetHeader::read(&mut Cursor::new(two)).unwrap();
        let chains = link_chains(&[("two.cab", &header)]);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].missing(), Some("one.cab"));
        assert!(!chains[0].is_standalone());
    }

    #[test]
    fn merge_file_spanning_parts() {
        let first = raw_cabinet(
            None,
            Some("b.cab"),
            0,
            &[vec![("hello, wor", 10)]],
            &[
                RawFile { name: "hello", size: 5, offset: 0, folder: 0 },
                RawFile { name: "span", size: 10, offset: 5, folder: 0xfffe },
            ],
        );
        let second = raw_cabinet(
            Some("a.cab"),
            None,
            1,
            &[vec![("ld!!!", 5)], vec![("tail", 4)]],
            &[
                RawFile { name: "span", size: 10, offset: 5, folder: 0xfffd },
                RawFile { name: "tail", size: 4, offset: 0, folder: 1 },
            ],
        );
        let mut parts = [Cursor::new(first), Cursor::new(second)];
        let mut merged = Vec::new();
        merge_cabinets(&mut parts, &mut merged).unwrap();

        let cabinet = cab::Cabinet::new(Cursor::new(merged.clone())).unwrap();
        let names: Vec<String> = cabinet
            .folder_entries()
            .flat_map(|folder| folder.file_entries())
            .map(|file| file.name().to_string())
            .collect();
        assert_eq!(names, vec!["hello", "span", "tail"]);
        assert_eq!(read_all(merged.clone(), "hello"), b"hello");
        assert_eq!(read_all(merged.clone(), "span"), b", world!!!");
        assert_eq!(read_all(merged, "tail"), b"tail");
    }

    #[test]
    fn merge_split_data_block() {
        let first = raw_cabinet(
            None,
            Some("b.cab"),
            0,
            &[vec![("abc", 3), ("defg", 0)]],
            &[RawFile { name: "letters", size: 10, offset: 0, folder: 0xfffe }],
        );
        let second = raw_cabinet(
            Some("a.cab"),
            None,
            1,
            &[vec![("hij", 7)]],
            &[RawFile { name: "letters", size: 10, offset: 0, folder: 0xfffd }],
        );
        let mut parts = [Cursor::new(first), Cursor::new(second)];
        let mut merged = Vec::new();
        merge_cabinets(&mut parts, &mut merged).unwrap();
        let cabinet = cab::Cabinet::new(Cursor::new(merged.clone())).unwrap();
        let folder = cabinet.folder_entries().next().unwrap();
        assert_eq!(folder.num_data_blocks(), 2);
        assert_eq!(read_all(merged, "letters"), b"abcdefghij");
    }

    #[test]
    fn merge_rejects_truncated_set() {
        let first = raw_cabinet(
            None,
            Some("b.cab"),
            0,
            &[vec![("abc", 0)]],
            &[RawFile { name: "x", size: 3, offset: 0, folder: 0xfffe }],
        );
        let mut parts = [Cursor::new(first)];
        let error = merge_cabinets(&mut parts, &mut Vec::<u8>::new()).unwrap_err();
        assert_eq!(error.kind(), std::io::ErrorKind::InvalidData);
    }
}

// ========================================================================= //
