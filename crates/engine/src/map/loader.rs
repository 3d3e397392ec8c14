use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};
use tracing::info;

use crate::cache::{Handle, ImageCache, LocationKind, RenderableLocation};
use crate::geometry::{
    GridGeometry, Point, DEFAULT_HEX_CELL_HEIGHT_PX, DEFAULT_HEX_CELL_WIDTH_PX,
    DEFAULT_HEX_ROW_HEIGHT_PX, DEFAULT_ISO_CELL_HEIGHT_PX, DEFAULT_ISO_CELL_WIDTH_PX,
    DEFAULT_RECT_CELL_SIZE_PX,
};

use super::{
    Map, MapElevation, MapObject, MapTileGrid, ObjectGrid, OBJECT_GRID_WIDTH, POS_NOT_ON_MAP,
};

/// Largest `width * height` a map grid may declare.
pub const MAX_GRID_CELLS: u64 = 1 << 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownElement,
    MissingField,
    InvalidValue,
    MissingFloor,
    CellOutOfRange,
}

#[derive(Debug, Clone)]
pub struct MapLoadError {
    pub code: MapErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for MapLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for MapLoadError {}

/// Reads an XML map and registers every referenced asset in `cache`.
pub fn load_map_file(path: &Path, cache: &mut ImageCache) -> Result<Map, MapLoadError> {
    let raw = fs::read_to_string(path).map_err(|error| MapLoadError {
        code: MapErrorCode::ReadFile,
        message: format!("failed to read map file: {error}"),
        file_path: path.to_path_buf(),
        location: None,
    })?;
    parse_map_xml(&raw, path, cache)
}

/// Parses map XML; `file_path` is only used for error reports.
///
/// ```xml
/// <map name="demo">
///   <elevation>
///     <floor width="8" height="8" geometry="hex">
///       <fill src="tiles/grass.png"/>
///       <tile x="2" y="3" src="tiles/stone.png"/>
///     </floor>
///     <roof width="8" height="8" geometry="hex" shift_y="-96" alpha="200"/>
///     <objects geometry="hex">
///       <object name="torch" x="4" y="4" src="anims/torch.xml"/>
///     </objects>
///   </elevation>
/// </map>
/// ```
pub fn parse_map_xml(
    raw: &str,
    file_path: &Path,
    cache: &mut ImageCache,
) -> Result<Map, MapLoadError> {
    let doc = Document::parse(raw).map_err(|error| MapLoadError {
        code: MapErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let parser = MapParser {
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "map" {
        return Err(parser.error_at(
            MapErrorCode::InvalidRoot,
            root,
            "root element must be <map>".to_string(),
        ));
    }

    let name = root.attribute("name").unwrap_or_default().trim();
    let mut map = Map::new(name);
    let mut object_count = 0usize;
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "elevation" {
            return Err(parser.unknown_element(child, "map"));
        }
        let elevation = parser.parse_elevation(child, cache)?;
        object_count += elevation.objects().len();
        map.add_elevation(elevation);
    }

    info!(
        map = map.name(),
        file = %file_path.display(),
        elevations = map.elevation_count(),
        objects = object_count,
        "map_loaded"
    );
    Ok(map)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertMode {
    Ordered,
    Back,
    Front,
}

struct MapParser<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl MapParser<'_, '_> {
    fn parse_elevation(
        &self,
        node: Node<'_, '_>,
        cache: &mut ImageCache,
    ) -> Result<MapElevation, MapLoadError> {
        let mut floor: Option<MapTileGrid> = None;
        let mut roof: Option<MapTileGrid> = None;
        let mut object_nodes = Vec::new();

        for child in node.children().filter(|child| child.is_element()) {
            match child.tag_name().name() {
                "floor" => floor = Some(self.parse_tile_grid(child, cache)?),
                "roof" => roof = Some(self.parse_tile_grid(child, cache)?),
                "objects" => object_nodes.push(child),
                _ => return Err(self.unknown_element(child, "elevation")),
            }
        }

        let Some(floor) = floor else {
            return Err(self.error_at(
                MapErrorCode::MissingFloor,
                node,
                "<elevation> requires a <floor> layer".to_string(),
            ));
        };
        let roof = roof.unwrap_or_else(|| {
            MapTileGrid::new(floor.width(), floor.height(), *floor.geometry())
        });

        let mut grids = Vec::with_capacity(object_nodes.len());
        for objects in &object_nodes {
            grids.push(self.parse_object_grid_header(*objects)?);
        }
        let mut grids = grids.into_iter();
        let first = grids
            .next()
            .unwrap_or_else(|| ObjectGrid::with_geometry(*floor.geometry()));
        let mut elevation = MapElevation::new(floor, roof, first);
        for grid in grids {
            elevation.add_object_grid(grid);
        }

        for (grid_index, objects) in object_nodes.iter().enumerate() {
            for child in objects.children().filter(|child| child.is_element()) {
                if child.tag_name().name() != "object" {
                    return Err(self.unknown_element(child, "objects"));
                }
                self.parse_object(child, grid_index, &mut elevation, cache)?;
            }
        }
        Ok(elevation)
    }

    fn parse_tile_grid(
        &self,
        node: Node<'_, '_>,
        cache: &mut ImageCache,
    ) -> Result<MapTileGrid, MapLoadError> {
        let width = self.required::<u32>(node, "width")?;
        let height = self.required::<u32>(node, "height")?;
        self.check_grid_size(node, width, height)?;
        let geometry = self.parse_geometry(node)?;
        let mut grid = MapTileGrid::new(width, height, geometry);
        grid.set_shift(self.parse_shift(node)?);
        if let Some(alpha) = self.optional::<i32>(node, "alpha")? {
            grid.set_global_alpha(alpha);
        }

        for child in node.children().filter(|child| child.is_element()) {
            match child.tag_name().name() {
                "fill" => {
                    let handle = self.register_visual(child, cache)?;
                    grid.fill(handle);
                }
                "tile" => {
                    let x = self.required::<i32>(child, "x")?;
                    let y = self.required::<i32>(child, "y")?;
                    let handle = self.register_visual(child, cache)?;
                    grid.set_tile(x, y, handle).map_err(|error| {
                        self.error_at(MapErrorCode::CellOutOfRange, child, error.to_string())
                    })?;
                }
                _ => return Err(self.unknown_element(child, node.tag_name().name())),
            }
        }
        Ok(grid)
    }

    fn parse_object_grid_header(&self, node: Node<'_, '_>) -> Result<ObjectGrid, MapLoadError> {
        let geometry = self.parse_geometry(node)?;
        let width = self.optional::<u32>(node, "width")?.unwrap_or(OBJECT_GRID_WIDTH);
        let height = self.optional::<u32>(node, "height")?.unwrap_or(OBJECT_GRID_WIDTH);
        self.check_grid_size(node, width, height)?;
        let mut grid = ObjectGrid::new(width, height, geometry);
        grid.set_shift(self.parse_shift(node)?);
        Ok(grid)
    }

    fn parse_object(
        &self,
        node: Node<'_, '_>,
        grid_index: usize,
        elevation: &mut MapElevation,
        cache: &mut ImageCache,
    ) -> Result<(), MapLoadError> {
        let (grid_width, grid_height) = elevation
            .object_grid(grid_index)
            .map(|grid| (grid.width() as i32, grid.height() as i32))
            .unwrap_or_default();
        let position = match self.optional::<i32>(node, "position")? {
            Some(position) => position,
            None => match (
                self.optional::<i32>(node, "x")?,
                self.optional::<i32>(node, "y")?,
            ) {
                (None, None) => POS_NOT_ON_MAP,
                (Some(x), Some(y))
                    if (0..grid_width).contains(&x) && (0..grid_height).contains(&y) =>
                {
                    y.checked_mul(grid_width)
                        .and_then(|row| row.checked_add(x))
                        .ok_or_else(|| {
                            self.error_at(
                                MapErrorCode::InvalidValue,
                                node,
                                format!("<object> cell {x},{y} has no representable position"),
                            )
                        })?
                }
                _ => {
                    return Err(self.error_at(
                        MapErrorCode::InvalidValue,
                        node,
                        format!(
                            "<object> x/y must both be set inside the {grid_width}x{grid_height} grid"
                        ),
                    ))
                }
            },
        };

        let mut object = MapObject::new(node.attribute("name").unwrap_or_default().trim(), position)
            .with_shift(self.parse_shift(node)?);
        if let Some(opacity) = self.optional::<u8>(node, "opacity")? {
            object.set_opacity(opacity);
        }
        if node.has_attribute("src") {
            object.set_visual(self.register_visual(node, cache)?);
        }

        let mode = match node.attribute("insert").map(str::trim) {
            None | Some("ordered") => InsertMode::Ordered,
            Some("back") => InsertMode::Back,
            Some("front") => InsertMode::Front,
            Some(other) => {
                return Err(self.error_at(
                    MapErrorCode::InvalidValue,
                    node,
                    format!("invalid insert mode '{other}'; allowed values: ordered, back, front"),
                ))
            }
        };
        let result = match mode {
            InsertMode::Ordered => elevation.add_object_to(grid_index, object, true),
            InsertMode::Back => elevation.add_object_to(grid_index, object, false),
            InsertMode::Front => elevation.add_object_front_to(grid_index, object),
        };
        result
            .map(|_| ())
            .map_err(|error| self.error_at(MapErrorCode::InvalidValue, node, error.to_string()))
    }

    fn register_visual(
        &self,
        node: Node<'_, '_>,
        cache: &mut ImageCache,
    ) -> Result<Handle, MapLoadError> {
        let src = self.required::<String>(node, "src")?;
        let mut location = RenderableLocation::file(src);
        let kind = match node.attribute("kind").map(str::trim) {
            Some("image") => LocationKind::Image,
            Some("animation") => LocationKind::Animation,
            Some("complex_animation") => LocationKind::ComplexAnimation,
            Some(other) => {
                return Err(self.error_at(
                    MapErrorCode::InvalidValue,
                    node,
                    format!(
                        "invalid kind '{other}'; allowed values: image, animation, complex_animation"
                    ),
                ))
            }
            None if location.file_extension().eq_ignore_ascii_case("xml") => {
                LocationKind::Animation
            }
            None => LocationKind::Image,
        };
        location = location.with_kind(kind);
        if let Some(frame) = self.optional::<u32>(node, "frame")? {
            location = location.with_frame(frame);
        }
        if let Some(direction) = self.optional::<u32>(node, "direction")? {
            location = location.with_direction(direction);
        }
        Ok(cache.add_from_location(location))
    }

    fn check_grid_size(
        &self,
        node: Node<'_, '_>,
        width: u32,
        height: u32,
    ) -> Result<(), MapLoadError> {
        let cells = u64::from(width) * u64::from(height);
        if cells > MAX_GRID_CELLS {
            return Err(self.error_at(
                MapErrorCode::InvalidValue,
                node,
                format!(
                    "<{}> of {width}x{height} exceeds the limit of {MAX_GRID_CELLS} cells",
                    node.tag_name().name()
                ),
            ));
        }
        Ok(())
    }

    fn parse_geometry(&self, node: Node<'_, '_>) -> Result<GridGeometry, MapLoadError> {
        let kind = node.attribute("geometry").map(str::trim).unwrap_or("rectangular");
        let (default_width, default_height) = match kind {
            "rectangular" => (DEFAULT_RECT_CELL_SIZE_PX, DEFAULT_RECT_CELL_SIZE_PX),
            "hex" => (DEFAULT_HEX_CELL_WIDTH_PX, DEFAULT_HEX_CELL_HEIGHT_PX),
            "isometric" => (DEFAULT_ISO_CELL_WIDTH_PX, DEFAULT_ISO_CELL_HEIGHT_PX),
            other => {
                return Err(self.error_at(
                    MapErrorCode::InvalidValue,
                    node,
                    format!(
                        "invalid geometry '{other}'; allowed values: rectangular, hex, isometric"
                    ),
                ))
            }
        };
        let width = self.optional::<u32>(node, "cell_width")?.unwrap_or(default_width);
        let height = self.optional::<u32>(node, "cell_height")?.unwrap_or(default_height);
        Ok(match kind {
            "hex" => {
                let row_height = self
                    .optional::<u32>(node, "row_height")?
                    .unwrap_or(DEFAULT_HEX_ROW_HEIGHT_PX);
                GridGeometry::hex(width, height, row_height)
            }
            "isometric" => GridGeometry::isometric(width, height),
            _ => GridGeometry::rectangular(width, height),
        })
    }

    fn parse_shift(&self, node: Node<'_, '_>) -> Result<Point, MapLoadError> {
        Ok(Point::new(
            self.optional::<i32>(node, "shift_x")?.unwrap_or_default(),
            self.optional::<i32>(node, "shift_y")?.unwrap_or_default(),
        ))
    }

    fn required<T: FromStr>(&self, node: Node<'_, '_>, name: &str) -> Result<T, MapLoadError> {
        match self.optional(node, name)? {
            Some(value) => Ok(value),
            None => Err(self.error_at(
                MapErrorCode::MissingField,
                node,
                format!(
                    "<{}> is missing required attribute '{}'",
                    node.tag_name().name(),
                    name
                ),
            )),
        }
    }

    fn optional<T: FromStr>(
        &self,
        node: Node<'_, '_>,
        name: &str,
    ) -> Result<Option<T>, MapLoadError> {
        let Some(raw) = node.attribute(name).map(str::trim) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<T>().map(Some).map_err(|_| {
            self.error_at(
                MapErrorCode::InvalidValue,
                node,
                format!("attribute '{name}' has invalid value '{raw}'"),
            )
        })
    }

    fn unknown_element(&self, node: Node<'_, '_>, parent: &str) -> MapLoadError {
        self.error_at(
            MapErrorCode::UnknownElement,
            node,
            format!("unknown element <{}> in <{parent}>", node.tag_name().name()),
        )
    }

    fn error_at(&self, code: MapErrorCode, node: Node<'_, '_>, message: String) -> MapLoadError {
        let pos = self.doc.text_pos_at(node.range().start);
        MapLoadError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::test_fixtures::write_file;
    use tempfile::TempDir;

    fn cache(root: &Path) -> ImageCache {
        ImageCache::new(root, CacheConfig::default())
    }

    fn parse(raw: &str, cache: &mut ImageCache) -> Result<Map, MapLoadError> {
        parse_map_xml(raw, Path::new("maps/test.xml"), cache)
    }

    #[test]
    fn parses_layers_tiles_and_objects() {
        let temp = TempDir::new().expect("temp");
        let mut cache = cache(temp.path());
        let raw = r#"<map name="demo">
  <elevation>
    <floor width="3" height="2" geometry="hex" alpha="200">
      <fill src="tiles/grass.png"/>
      <tile x="1" y="1" src="tiles/stone.png"/>
    </floor>
    <roof width="3" height="2" geometry="hex" shift_y="-96"/>
    <objects geometry="hex">
      <object name="b" position="410" src="objs/barrel.png"/>
      <object name="a" x="5" y="0" src="anims/torch.xml" opacity="128"/>
      <object name="c" x="1" y="1" insert="front"/>
    </objects>
  </elevation>
</map>"#;
        let map = parse(raw, &mut cache).expect("map");
        assert_eq!(map.name(), "demo");
        let elevation = map.elevation(0).expect("elevation");

        let floor = elevation.floor();
        assert_eq!(floor.global_alpha(), 200);
        assert_eq!(floor.geometry().name(), "hex");
        let grass = floor.tile_at(0, 0);
        let stone = floor.tile_at(1, 1);
        assert!(!grass.is_undefined());
        assert_ne!(grass, stone);
        assert_eq!(floor.tile_at(2, 1), grass);
        assert_eq!(elevation.roof().shift(), Point::new(0, -96));
        assert!(!elevation.roof().has_tiles());

        let order: Vec<_> = elevation
            .objects_in_draw_order(0)
            .map(|(_, object)| (object.name(), object.position()))
            .collect();
        assert_eq!(order, vec![("c", 201), ("a", 5), ("b", 410)]);

        let torch = elevation
            .objects()
            .iter()
            .find(|object| object.name() == "a")
            .expect("torch");
        assert_eq!(torch.opacity(), 128);
        let location = cache.location(torch.visual()).expect("torch location");
        assert_eq!(location.kind(), LocationKind::Animation);
    }

    #[test]
    fn shared_sources_share_handles() {
        let temp = TempDir::new().expect("temp");
        let mut cache = cache(temp.path());
        let raw = r#"<map>
  <elevation>
    <floor width="2" height="1">
      <tile x="0" y="0" src="a.png"/>
      <tile x="1" y="0" src="a.png" frame="1"/>
    </floor>
    <objects>
      <object name="o" position="3" src="a.png"/>
    </objects>
  </elevation>
</map>"#;
        let map = parse(raw, &mut cache).expect("map");
        let elevation = map.elevation(0).expect("elevation");
        let first = elevation.floor().tile_at(0, 0);
        assert_ne!(first, elevation.floor().tile_at(1, 0));
        assert_eq!(elevation.objects()[0].visual(), first);
        // Sentinel slot plus two locations.
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn missing_roof_and_objects_get_defaults() {
        let temp = TempDir::new().expect("temp");
        let mut cache = cache(temp.path());
        let raw = r#"<map><elevation><floor width="4" height="3" geometry="isometric"/></elevation></map>"#;
        let map = parse(raw, &mut cache).expect("map");
        let elevation = map.elevation(0).expect("elevation");
        assert_eq!(elevation.roof().width(), 4);
        assert_eq!(elevation.roof().height(), 3);
        assert_eq!(elevation.object_grids().len(), 1);
        assert_eq!(elevation.object_grids()[0].geometry().name(), "isometric");
    }

    #[test]
    fn reports_missing_attribute_with_position() {
        let temp = TempDir::new().expect("temp");
        let mut cache = cache(temp.path());
        let raw = "<map>\n  <elevation>\n    <floor height=\"2\"/>\n  </elevation>\n</map>";
        let error = parse(raw, &mut cache).expect_err("missing width");
        assert_eq!(error.code, MapErrorCode::MissingField);
        assert_eq!(error.location, Some(SourceLocation { line: 3, column: 5 }));
        assert!(error.to_string().contains("'width'"));
    }

    #[test]
    fn tile_outside_grid_is_rejected() {
        let temp = TempDir::new().expect("temp");
        let mut cache = cache(temp.path());
        let raw = r#"<map><elevation><floor width="2" height="2"><tile x="2" y="0" src="a.png"/></floor></elevation></map>"#;
        let error = parse(raw, &mut cache).expect_err("out of range");
        assert_eq!(error.code, MapErrorCode::CellOutOfRange);
    }

    #[test]
    fn object_cells_outside_the_grid_are_rejected() {
        let temp = TempDir::new().expect("temp");
        let mut cache = cache(temp.path());
        for cell in [r#"x="1" y="20000000""#, r#"x="1" y="4""#, r#"x="-1" y="0""#] {
            let raw = format!(
                "<map><elevation><floor width=\"2\" height=\"2\"/>\n<objects width=\"4\" height=\"4\">\n  <object name=\"o\" {cell}/>\n</objects></elevation></map>"
            );
            let error = parse(&raw, &mut cache).expect_err(cell);
            assert_eq!(error.code, MapErrorCode::InvalidValue, "{cell}");
            assert_eq!(error.location, Some(SourceLocation { line: 3, column: 3 }), "{cell}");
        }
    }

    #[test]
    fn oversized_grids_are_rejected_before_allocating() {
        let temp = TempDir::new().expect("temp");
        let mut cache = cache(temp.path());
        for raw in [
            r#"<map><elevation><floor width="100000" height="100000"/></elevation></map>"#,
            r#"<map><elevation><floor width="2" height="2"/><roof width="4294967295" height="2"/></elevation></map>"#,
            r#"<map><elevation><floor width="2" height="2"/><objects width="65536" height="65536"/></elevation></map>"#,
        ] {
            let error = parse(raw, &mut cache).expect_err(raw);
            assert_eq!(error.code, MapErrorCode::InvalidValue, "{raw}");
            assert!(error.to_string().contains("exceeds the limit"), "{raw}");
        }
    }

    #[test]
    fn rejects_bad_root_unknown_elements_and_values() {
        let temp = TempDir::new().expect("temp");
        let mut cache = cache(temp.path());
        let cases = [
            ("<level/>", MapErrorCode::InvalidRoot),
            ("<map><floor/></map>", MapErrorCode::UnknownElement),
            ("<map><elevation/></map>", MapErrorCode::MissingFloor),
            (
                r#"<map><elevation><floor width="2" height="2" geometry="octagon"/></elevation></map>"#,
                MapErrorCode::InvalidValue,
            ),
            (
                r#"<map><elevation><floor width="two" height="2"/></elevation></map>"#,
                MapErrorCode::InvalidValue,
            ),
            ("<map><elevation>", MapErrorCode::XmlMalformed),
        ];
        for (raw, code) in cases {
            let error = parse(raw, &mut cache).expect_err(raw);
            assert_eq!(error.code, code, "{raw}");
        }
    }

    #[test]
    fn load_map_file_reads_from_disk() {
        let temp = TempDir::new().expect("temp");
        let path = write_file(
            temp.path(),
            "maps/tiny.xml",
            r#"<map name="tiny"><elevation><floor width="1" height="1"/></elevation></map>"#,
        );
        let mut cache = cache(temp.path());
        let map = load_map_file(&path, &mut cache).expect("map");
        assert_eq!(map.name(), "tiny");

        let error = load_map_file(&temp.path().join("maps/none.xml"), &mut cache)
            .expect_err("missing file");
        assert_eq!(error.code, MapErrorCode::ReadFile);
        assert!(error.location.is_none());
    }
}
