// 区（구）相关的静态数据

/// 区人口未知时的默认值
pub const DEFAULT_POPULATION: u32 = 400_000;

const DISTRICT_POPULATION: [(&str, u32); 25] = [
    ("종로구", 149_608),
    ("중구", 131_214),
    ("용산구", 217_154),
    ("성동구", 281_259),
    ("광진구", 345_652),
    ("동대문구", 358_603),
    ("중랑구", 385_349),
    ("성북구", 435_037),
    ("강북구", 299_374),
    ("도봉구", 306_032),
    ("노원구", 496_552),
    ("은평구", 465_350),
    ("서대문구", 318_622),
    ("마포구", 372_745),
    ("양천구", 434_351),
    ("강서구", 562_194),
    ("구로구", 411_916),
    ("금천구", 239_070),
    ("영등포구", 397_173),
    ("동작구", 387_352),
    ("관악구", 495_620),
    ("서초구", 413_076),
    ("강남구", 563_215),
    ("송파구", 656_310),
    ("강동구", 451_474),
];

/// 从地址中取出以 "구" 结尾的第一个词，例如 "서울특별시 중구 세종대로 110" -> "중구"
pub fn extract_district(address: &str) -> Option<&str> {
    address
        .split_whitespace()
        .find(|part| part.ends_with('구'))
}

pub fn population_of(district: Option<&str>) -> u32 {
    district
        .and_then(|name| {
            DISTRICT_POPULATION
                .iter()
                .find(|(candidate, _)| *candidate == name)
                .map(|(_, population)| *population)
        })
        .unwrap_or(DEFAULT_POPULATION)
}
