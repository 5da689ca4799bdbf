//! World map: terrain grid, cell geometry and map file loading

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{error, info};

use crate::rpc::protocol::{Color, ColorMapEntry, MapDefinition};

use super::geometry::{push_out, Rect, Vec2};

/// Width of the rendering budget the map must fit into
pub const RENDER_WIDTH: u32 = 800;
/// Height of the rendering budget the map must fit into
pub const RENDER_HEIGHT: u32 = 600;

/// Identifier of a passable cell
pub const BLANK: char = ' ';

/// Map loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Failed to read map file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse map file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Malformed map: {0}")]
    MalformedMap(String),

    #[error("Unknown color entry `{identifier}` at row {row}, column {col}")]
    UnknownMapIdentifier {
        identifier: char,
        row: usize,
        col: usize,
    },
}

/// A single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Passable (blank, or past the end of a short row)
    Empty,
    /// Wall with a configured color
    Solid { identifier: char, color: Color },
    /// Identifier missing from the color table; drawn in the default color, passable
    Unknown(char),
}

impl Cell {
    pub fn is_solid(&self) -> bool {
        matches!(self, Cell::Solid { .. })
    }

    /// Color to draw this cell with, `None` for empty cells
    pub fn color(&self) -> Option<Color> {
        match self {
            Cell::Empty => None,
            Cell::Solid { color, .. } => Some(*color),
            Cell::Unknown(_) => Some(Color::WHITE),
        }
    }
}

/// Immutable world map built from a [`MapDefinition`]
#[derive(Debug, Clone)]
pub struct WorldMap {
    definition: MapDefinition,
    cells: Vec<Cell>,
    width: usize,
    height: usize,
    cell_size: u32,
    origin: Vec2,
}

impl WorldMap {
    /// Build a map, fitting the grid into the render budget.
    ///
    /// Rows may have different lengths; the width is the longest row.
    /// Unknown identifiers are logged and treated as passable.
    pub fn new(definition: MapDefinition) -> Result<Self, MapError> {
        let colors = color_table(&definition.color_map)?;

        let height = definition.map.len();
        if height == 0 {
            return Err(MapError::MalformedMap("map has no rows".to_string()));
        }

        let width = definition
            .map
            .iter()
            .map(|row| row.chars().count())
            .max()
            .unwrap_or(0);
        if width == 0 {
            return Err(MapError::MalformedMap("all map rows are empty".to_string()));
        }

        let cell_size = (RENDER_WIDTH / width as u32).min(RENDER_HEIGHT / height as u32);
        if cell_size == 0 {
            return Err(MapError::MalformedMap(format!(
                "{}x{} grid does not fit into {}x{}",
                width, height, RENDER_WIDTH, RENDER_HEIGHT
            )));
        }

        let mut cells = vec![Cell::Empty; width * height];
        for (row, line) in definition.map.iter().enumerate() {
            for (col, identifier) in line.chars().enumerate() {
                if identifier == BLANK {
                    continue;
                }
                cells[row * width + col] = match colors.get(&identifier) {
                    Some(color) => Cell::Solid {
                        identifier,
                        color: *color,
                    },
                    None => {
                        let err = MapError::UnknownMapIdentifier {
                            identifier,
                            row,
                            col,
                        };
                        error!(error = %err, "Skipping map cell");
                        Cell::Unknown(identifier)
                    }
                };
            }
        }

        // Centered in the render budget
        let map_w = cell_size * width as u32;
        let map_h = cell_size * height as u32;
        let origin = Vec2::new(
            (RENDER_WIDTH / 2) as f32 - (map_w / 2) as f32,
            (RENDER_HEIGHT / 2) as f32 - (map_h / 2) as f32,
        );

        Ok(Self {
            definition,
            cells,
            width,
            height,
            cell_size,
            origin,
        })
    }

    /// Load and validate a JSON map file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let file: MapFile = serde_json::from_str(&contents)?;
        let map = Self::new(file.into_definition())?;
        info!(
            path = %path.display(),
            width = map.width,
            height = map.height,
            cell_size = map.cell_size,
            "Loaded map"
        );
        Ok(map)
    }

    /// Startup map: the file at `path` if it loads, the built-in arena otherwise.
    ///
    /// A missing or malformed file is logged, never fatal.
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            info!("No MAP_PATH set, using built-in map");
            return Self::builtin();
        };

        match Self::from_file(path) {
            Ok(map) => map,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Map file rejected, using built-in map");
                Self::builtin()
            }
        }
    }

    /// Built-in arena: a single wall block in the middle
    pub fn builtin() -> Self {
        let definition = MapDefinition {
            color_map: vec![ColorMapEntry {
                identifier: "A".to_string(),
                color: Color::new(255, 0, 0),
            }],
            map: vec!["   ".to_string(), " A ".to_string(), "   ".to_string()],
        };
        Self::new(definition).expect("built-in map is valid")
    }

    /// The definition this map was built from, as sent to joining clients
    pub fn definition(&self) -> &MapDefinition {
        &self.definition
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Side length of one cell in world units
    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Top-left corner of the map in world space
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// World-space extent of the whole grid
    pub fn bounds(&self) -> Rect {
        let size = self.cell_size as f32;
        Rect::new(
            self.origin.x,
            self.origin.y,
            size * self.width as f32,
            size * self.height as f32,
        )
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<Cell> {
        if col >= self.width || row >= self.height {
            return None;
        }
        Some(self.cells[row * self.width + col])
    }

    /// World-space bounding box of a grid cell
    pub fn cell_rect(&self, col: usize, row: usize) -> Rect {
        let size = self.cell_size as f32;
        Rect::new(
            self.origin.x + col as f32 * size,
            self.origin.y + row as f32 * size,
            size,
            size,
        )
    }

    /// Grid coordinates of the cell enclosing a world point
    pub fn cell_coords_at(&self, point: Vec2) -> Option<(usize, usize)> {
        if !self.bounds().contains(point) {
            return None;
        }
        let size = self.cell_size as f32;
        let col = ((point.x - self.origin.x) / size) as usize;
        let row = ((point.y - self.origin.y) / size) as usize;
        Some((col.min(self.width - 1), row.min(self.height - 1)))
    }

    /// Bounding box of the cell enclosing a world point
    pub fn enclosing_cell_rect(&self, point: Vec2) -> Option<Rect> {
        self.cell_coords_at(point)
            .map(|(col, row)| self.cell_rect(col, row))
    }

    /// True when the point lies inside a wall
    pub fn is_wall_at(&self, point: Vec2) -> bool {
        self.cell_coords_at(point)
            .and_then(|(col, row)| self.cell(col, row))
            .is_some_and(|cell| cell.is_solid())
    }

    /// Bounding boxes of every wall cell
    pub fn solid_rects(&self) -> impl Iterator<Item = Rect> + '_ {
        (0..self.height).flat_map(move |row| {
            (0..self.width).filter_map(move |col| {
                self.cell(col, row)
                    .filter(Cell::is_solid)
                    .map(|_| self.cell_rect(col, row))
            })
        })
    }

    /// Offset that moves a box out of every wall it overlaps
    pub fn resolve_box(&self, mover: Rect) -> Vec2 {
        let mut resolved = mover;
        for wall in self.solid_rects() {
            let offset = push_out(&resolved, &wall);
            resolved = resolved.translate(offset);
        }
        Vec2::new(resolved.x - mover.x, resolved.y - mover.y)
    }
}

fn color_table(entries: &[ColorMapEntry]) -> Result<HashMap<char, Color>, MapError> {
    let mut table = HashMap::with_capacity(entries.len());
    for entry in entries {
        let mut chars = entry.identifier.chars();
        match (chars.next(), chars.next()) {
            (Some(identifier), None) if identifier != BLANK => {
                table.insert(identifier, entry.color);
            }
            _ => {
                return Err(MapError::MalformedMap(format!(
                    "color identifier `{}` must be a single non-blank character",
                    entry.identifier
                )))
            }
        }
    }
    Ok(table)
}

/// On-disk map format: `{"map": [rows], "colors": {"A": [r, g, b]}}`
#[derive(Debug, Deserialize)]
pub struct MapFile {
    pub map: Vec<String>,
    #[serde(default)]
    pub colors: BTreeMap<String, [u8; 3]>,
}

impl MapFile {
    pub fn into_definition(self) -> MapDefinition {
        MapDefinition {
            color_map: self
                .colors
                .into_iter()
                .map(|(identifier, [r, g, b])| ColorMapEntry {
                    identifier,
                    color: Color::new(r, g, b),
                })
                .collect(),
            map: self.map,
        }
    }
}
