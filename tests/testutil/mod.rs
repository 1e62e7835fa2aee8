#![allow(dead_code, unused_macros)]

use byteorder::{LittleEndian, WriteBytesExt};
use msi::{Column, Insert, Package, PackageType, Value};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

// ========================================================================= //

macro_rules! assert_error {
    ($e:expr, $p:pat) => {
        match $e {
            Ok(_) => panic!(
                "Expected {} error, but result was Ok",
                stringify!($p)
            ),
            Err(error) => {
                if !matches!(error, $p) {
                    panic!(
                        "Expected {} error, but result was {:?}",
                        stringify!($p),
                        error
                    );
                }
            }
        }
    };
    ($e:expr, $k:expr, $d:expr) => {
        let kind = $k;
        let description = $d;
        match $e {
            Ok(_) => panic!("Expected {:?} error, but result was Ok", kind),
            Err(error) => {
                if error.kind() != kind {
                    panic!(
                        "Expected {:?} error, but result was {:?} error \
                            with description {:?}",
                        kind,
                        error.kind(),
                        error.to_string()
                    );
                }
                if error.to_string() != description {
                    panic!(
                        "Expected {:?} error with description {:?}, but \
                            result had description {:?}",
                        kind,
                        description,
                        error.to_string()
                    );
                }
            }
        }
    };
}

// ========================================================================= //

fn string(value: &str) -> Value {
    Value::Str(value.to_string())
}

fn optional(value: Option<&str>) -> Value {
    value.map_or(Value::Null, string)
}

/// Builds an installer package in memory with the tables extraction reads.
pub struct PackageBuilder {
    package: Package<Cursor<Vec<u8>>>,
    sequence: i32,
}

impl PackageBuilder {
    pub fn new() -> PackageBuilder {
        let cursor = Cursor::new(Vec::new());
        let mut package =
            Package::create(PackageType::Installer, cursor).unwrap();
        package
            .create_table(
                "Directory",
                vec![
                    Column::build("Directory").primary_key().string(72),
                    Column::build("Directory_Parent").nullable().string(72),
                    Column::build("DefaultDir").string(255),
                ],
            )
            .unwrap();
        package
            .create_table(
                "Component",
                vec![
                    Column::build("Component").primary_key().string(72),
                    Column::build("ComponentId").nullable().string(38),
                    Column::build("Directory_").string(72),
                    Column::build("Attributes").int16(),
                ],
            )
            .unwrap();
        package
            .create_table(
                "File",
                vec![
                    Column::build("File").primary_key().string(72),
                    Column::build("Component_").string(72),
                    Column::build("FileName").string(255),
                    Column::build("FileSize").int32(),
                    Column::build("Version").nullable().string(72),
                    Column::build("Sequence").int32(),
                ],
            )
            .unwrap();
        package
            .create_table(
                "Media",
                vec![
                    Column::build("DiskId").primary_key().int16(),
                    Column::build("LastSequence").int32(),
                    Column::build("Cabinet").nullable().string(255),
                ],
            )
            .unwrap();
        package
            .create_table(
                "Property",
                vec![
                    Column::build("Property").primary_key().string(72),
                    Column::build("Value").string(255),
                ],
            )
            .unwrap();
        PackageBuilder { package, sequence: 0 }
    }

    pub fn directory(
        mut self,
        directory: &str,
        parent: Option<&str>,
        default_dir: &str,
    ) -> PackageBuilder {
        let row = vec![string(directory), optional(parent), string(default_dir)];
        self.insert("Directory", row);
        self
    }

    pub fn component(mut self, component: &str, directory: &str) -> PackageBuilder {
        let row =
            vec![string(component), Value::Null, string(directory), Value::Int(0)];
        self.insert("Component", row);
        self
    }

    pub fn file(
        mut self,
        file: &str,
        component: &str,
        file_name: &str,
        file_size: i32,
    ) -> PackageBuilder {
        self.sequence += 1;
        let row = vec![
            string(file),
            string(component),
            string(file_name),
            Value::Int(file_size),
            Value::Null,
            Value::Int(self.sequence),
        ];
        self.insert("File", row);
        self
    }

    pub fn media(mut self, disk_id: i32, cabinet: Option<&str>) -> PackageBuilder {
        let row = vec![Value::Int(disk_id), Value::Int(self.sequence), optional(cabinet)];
        self.insert("Media", row);
        self
    }

    pub fn property(mut self, property: &str, value: &str) -> PackageBuilder {
        self.insert("Property", vec![string(property), string(value)]);
        self
    }

    pub fn stream(mut self, name: &str, data: &[u8]) -> PackageBuilder {
        self.package.write_stream(name).unwrap().write_all(data).unwrap();
        self
    }

    /// Adds a row to the `Binary` table, whose `Data` column is a stream.
    pub fn binary(mut self, name: &str, data: &[u8]) -> PackageBuilder {
        if !self.package.has_table("Binary") {
            self.package
                .create_table(
                    "Binary",
                    vec![
                        Column::build("Name").primary_key().id_string(72),
                        Column::build("Data").binary(),
                    ],
                )
                .unwrap();
        }
        self.insert("Binary", vec![Value::from(name), Value::Binary]);
        self.stream(&format!("Binary.{name}"), data)
    }

    pub fn title(mut self, title: &str) -> PackageBuilder {
        self.package.summary_info_mut().set_title(title.to_string());
        self
    }

    fn insert(&mut self, table: &str, row: Vec<Value>) {
        self.package.insert_rows(Insert::into(table).row(row)).unwrap();
    }

    pub fn into_package(self) -> Package<Cursor<Vec<u8>>> {
        let cursor = self.package.into_inner().unwrap();
        Package::open(cursor).unwrap()
    }

    pub fn write_to(self, path: &Path) {
        let cursor = self.package.into_inner().unwrap();
        fs::write(path, cursor.into_inner()).unwrap();
    }
}

/// The usual starting point: `TARGETDIR` (`SourceDir`) with a `bin`
/// subdirectory holding component `Main`.
pub fn basic_package() -> PackageBuilder {
    PackageBuilder::new()
        .directory("TARGETDIR", None, "SourceDir")
        .directory("D1", Some("TARGETDIR"), "BIN|bin")
        .component("Main", "D1")
}

// ========================================================================= //

/// Builds a standalone cabinet with one MSZIP folder holding the given
/// `(member name, contents)` pairs.
pub fn build_cabinet(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = cab::CabinetBuilder::new();
    {
        let folder = builder.add_folder(cab::CompressionType::MsZip);
        for &(name, _) in files {
            folder.add_file(name);
        }
    }
    let mut writer = builder.build(Cursor::new(Vec::new())).unwrap();
    let mut index = 0;
    while let Some(mut file_writer) = writer.next_file().unwrap() {
        file_writer.write_all(files[index].1.as_bytes()).unwrap();
        index += 1;
    }
    writer.finish().unwrap().into_inner()
}

/// One file entry of a hand-written cabinet.
pub struct RawFile<'a> {
    pub name: &'a str,
    pub size: u32,
    pub offset: u32,
    pub folder: u16,
}

/// Writes an uncompressed cabinet by hand, with optional links to the
/// previous and next cabinets of a set.  Each folder is a list of
/// `(payload, uncompressed size)` data blocks; a block with an uncompressed
/// size of zero continues in the next cabinet.
pub fn raw_cabinet(
    prev: Option<&str>,
    next: Option<&str>,
    set_index: u16,
    folders: &[Vec<(&str, u16)>],
    files: &[RawFile],
) -> Vec<u8> {
    let mut flags = 0u16;
    let mut links = Vec::new();
    for (flag, link) in [(0x1, prev), (0x2, next)] {
        if let Some(name) = link {
            flags |= flag;
            links.extend_from_slice(name.as_bytes());
            links.extend_from_slice(b"\0Disk\0");
        }
    }
    let files_offset = 36 + links.len() + 8 * folders.len();
    let files_size: usize =
        files.iter().map(|file| 16 + file.name.len() + 1).sum();
    let mut data_offset = files_offset + files_size;

    let mut cab = Vec::new();
    cab.extend_from_slice(b"MSCF");
    cab.write_u32::<LittleEndian>(0).unwrap();
    cab.write_u32::<LittleEndian>(0).unwrap(); // total size, patched below
    cab.write_u32::<LittleEndian>(0).unwrap();
    cab.write_u32::<LittleEndian>(files_offset as u32).unwrap();
    cab.write_u32::<LittleEndian>(0).unwrap();
    cab.extend_from_slice(&[3, 1]);
    cab.write_u16::<LittleEndian>(folders.len() as u16).unwrap();
    cab.write_u16::<LittleEndian>(files.len() as u16).unwrap();
    cab.write_u16::<LittleEndian>(flags).unwrap();
    cab.write_u16::<LittleEndian>(0x4d53).unwrap();
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

// ========================================================================= //

pub fn read_string(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// Lists every file under `root` as a sorted list of `/`-separated relative
/// paths.
pub fn list_files(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap();
            let parts: Vec<String> = relative
                .components()
                .map(|part| part.as_os_str().to_string_lossy().into_owned())
                .collect();
            parts.join("/")
        })
        .collect();
    names.sort();
    names
}

// ========================================================================= //
