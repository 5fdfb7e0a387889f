use std::path::Path;

/// Rows in [`synthetic_csv`]; the top fifth by views are trending.
pub const ROWS: usize = 60;

/// A corpus where trending rows have ten times the engagement of the rest.
pub fn synthetic_csv() -> String {
    let mut csv = String::from("Title,Channel,Views,Likes,Comments,Published At,Region\n");
    for i in 0..ROWS {
        let views = 1_000 + i as u64 * 1_000;
        let trending = i >= 48;
        let (likes, comments) = if trending {
            (views / 10, views / 50)
        } else {
            (views / 100, views / 500)
        };
        let title = if trending {
            format!("Official Trailer {i}!!")
        } else {
            format!("daily vlog part {i}")
        };
        let region = ["US", "IN", "GB", "JP", "CA"][i % 5];
        csv.push_str(&format!(
            "{title},chan{},{views},{likes},{comments},2025-05-{:02}T{:02}:00:00Z,{region}\n",
            i % 4,
            1 + i % 10,
            i % 24
        ));
    }
    csv
}

/// Corpus in which every row has the same view count.
pub fn single_class_csv() -> String {
    let mut csv = String::from("Title,Channel,Views,Likes,Comments,Published At,Region\n");
    for i in 0..20 {
        csv.push_str(&format!(
            "same {i},chan,5000,50,5,2025-05-01 12:00:00,US\n"
        ));
    }
    csv
}

pub fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
