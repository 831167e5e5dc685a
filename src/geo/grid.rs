use geohash::{Coord, Direction, GeohashError};

use super::{Coordinate, GridCellId};

/// 默认精度: 7 位 geohash，约 150m x 150m
pub const DEFAULT_PRECISION: usize = 7;

/// geohash 支持的最大精度
pub const MAX_PRECISION: usize = 12;

/// 八个方向及其 (纬度, 经度) 偏移: 北、东北、东、东南、南、西南、西、西北
const NEIGHBOR_DIRECTIONS: [(Direction, i32, i32); 8] = [
    (Direction::N, 1, 0),
    (Direction::NE, 1, 1),
    (Direction::E, 0, 1),
    (Direction::SE, -1, 1),
    (Direction::S, -1, 0),
    (Direction::SW, -1, -1),
    (Direction::W, 0, -1),
    (Direction::NW, 1, -1),
];

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("grid precision must be between 1 and {MAX_PRECISION}, got {0}")]
    InvalidPrecision(usize),
    #[error("geohash error: {0}")]
    Geohash(#[from] GeohashError),
}

/// 九宫格查询窗口，第一个元素永远是中心格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NineBlock {
    cells: Vec<GridCellId>,
}

impl NineBlock {
    pub fn center(&self) -> &GridCellId {
        &self.cells[0]
    }

    pub fn cells(&self) -> &[GridCellId] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// 固定精度的空间网格。
///
/// 同一个实例被查询层和写入方（给设施打格子标签）共用，保证两边精度一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialGrid {
    precision: usize,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
        }
    }
}

impl SpatialGrid {
    pub fn new(precision: usize) -> Result<Self, GridError> {
        if precision == 0 || precision > MAX_PRECISION {
            return Err(GridError::InvalidPrecision(precision));
        }
        Ok(Self { precision })
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn encode(&self, coord: Coordinate) -> Result<GridCellId, GridError> {
        let hash = geohash::encode(
            Coord {
                x: coord.longitude,
                y: coord.latitude,
            },
            self.precision,
        )?;
        Ok(GridCellId::from(hash))
    }

    /// 中心格加八个方向的相邻格（去重前固定 9 个）
    pub fn neighbors9_raw(&self, coord: Coordinate) -> Result<[GridCellId; 9], GridError> {
        let center = self.encode(coord)?;

        let around = match geohash::neighbors(center.as_str()) {
            Ok(n) => [n.n, n.ne, n.e, n.se, n.s, n.sw, n.w, n.nw].map(GridCellId::from),
            // 靠近极点或 ±180 经线时逐个方向处理
            Err(_) => {
                let mut around: [GridCellId; 8] = std::array::from_fn(|_| center.clone());
                for (slot, (direction, d_lat, d_lon)) in around.iter_mut().zip(NEIGHBOR_DIRECTIONS)
                {
                    *slot = self.adjacent(&center, direction, d_lat, d_lon)?;
                }
                around
            }
        };

        let mut cells: [GridCellId; 9] = std::array::from_fn(|_| center.clone());
        for (slot, cell) in cells.iter_mut().skip(1).zip(around) {
            *slot = cell;
        }
        Ok(cells)
    }

    /// 去重后的九宫格，顺序对同一输入稳定
    pub fn neighbors9(&self, coord: Coordinate) -> Result<NineBlock, GridError> {
        let mut cells: Vec<GridCellId> = Vec::with_capacity(9);
        for cell in self.neighbors9_raw(coord)? {
            if !cells.contains(&cell) {
                cells.push(cell);
            }
        }
        Ok(NineBlock { cells })
    }

    /// 检查一个已存储的格子 ID 是否与当前精度下的重新编码一致
    pub fn is_consistent(&self, coord: Coordinate, stored: &GridCellId) -> bool {
        stored.len() == self.precision
            && self
                .encode(coord)
                .is_ok_and(|encoded| &encoded == stored)
    }

    /// 格子的近似边长（米），用于日志和诊断
    pub fn cell_size_meters(&self, cell: &GridCellId) -> Result<(f64, f64), GridError> {
        let bounds = geohash::decode_bbox(cell.as_str())?;
        let lat = bounds.center().y;
        let height = bounds.height() * 111_320.0;
        let width = bounds.width() * 111_320.0 * lat.to_radians().cos();
        Ok((width, height))
    }

    /// 单个方向的相邻格。
    /// 直接相邻超出坐标范围时经度跨 ±180 回绕，纬度在极点截断（可能与中心格重复，由调用方去重）
    fn adjacent(
        &self,
        center: &GridCellId,
        direction: Direction,
        d_lat: i32,
        d_lon: i32,
    ) -> Result<GridCellId, GridError> {
        if let Ok(hash) = geohash::neighbor(center.as_str(), direction) {
            return Ok(GridCellId::from(hash));
        }

        let bounds = geohash::decode_bbox(center.as_str())?;
        let middle = bounds.center();
        let latitude = (middle.y + f64::from(d_lat) * bounds.height()).clamp(-90.0, 90.0);
        let mut longitude = middle.x + f64::from(d_lon) * bounds.width();
        if longitude > 180.0 {
            longitude -= 360.0;
        } else if longitude < -180.0 {
            longitude += 360.0;
        }
        self.encode(Coordinate::new(latitude, longitude))
    }
}
