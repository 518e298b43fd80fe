use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use foundation::bounds::{BoundingBox, merge_bounds};
use formats::{
    OccupationDirectory, parse_region_collection, parse_wage_table, region_collection_to_geojson,
};
use layers::{ChoroplethStyle, ClassifiedCollection, classify_all};
use scene::{LocationIndex, RegionCollection, parse_salary};

fn main() {
    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let cmd = args[1].clone();
    args.drain(0..2);

    match cmd.as_str() {
        "states" => cmd_states(args),
        "bounds" => cmd_bounds(args),
        "classify" => cmd_classify(args),
        "popup" => cmd_popup(args),
        "occupation" => cmd_occupation(args),
        _ => Err(usage()),
    }
}

fn cmd_states(args: Vec<String>) -> Result<(), String> {
    // wagemap states <counties.geojson>
    if args.len() != 1 {
        return Err(usage());
    }
    let index = LocationIndex::build(Arc::new(load_counties(Path::new(&args[0]))?));
    let excluded = index.collection().len()
        - index
            .state_abbrevs()
            .iter()
            .map(|s| index.counties(s).len())
            .sum::<usize>();

    for abbr in index.state_abbrevs() {
        println!("{abbr}\t{}", index.counties(abbr).len());
    }
    if excluded > 0 {
        eprintln!("{excluded} region(s) with unmapped state codes excluded");
    }
    Ok(())
}

fn cmd_bounds(args: Vec<String>) -> Result<(), String> {
    // wagemap bounds <counties.geojson> [--state AB] [--county ID]
    if args.is_empty() {
        return Err(usage());
    }
    let mut state: Option<String> = None;
    let mut county: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--state" => {
                i += 1;
                state = Some(flag_value(&args, i, "--state")?.to_ascii_uppercase());
            }
            "--county" => {
                i += 1;
                county = Some(flag_value(&args, i, "--county")?.to_string());
            }
            s => return Err(format!("unknown arg: {s}\n\n{}", usage())),
        }
        i += 1;
    }

    let index = LocationIndex::build(Arc::new(load_counties(Path::new(&args[0]))?));
    let bounds = match (county, state) {
        (Some(id), _) => index
            .region(&id)
            .ok_or_else(|| format!("unknown county {id}"))?
            .bounds(),
        (None, Some(abbr)) => index.state_bounds(&abbr),
        (None, None) => collection_bounds(index.collection()),
    };

    let Some(bounds) = bounds else {
        return Err("no geometry to bound".to_string());
    };
    print_json(&serde_json::json!({
        "bounds": bounds.to_corners(),
        "center": [bounds.center().lng, bounds.center().lat],
    }))
}

fn cmd_classify(args: Vec<String>) -> Result<(), String> {
    // wagemap classify <counties.geojson> <table.json> <salary> [--json]
    if args.len() < 3 {
        return Err(usage());
    }
    let mut as_geojson = false;
    for a in &args[3..] {
        match a.as_str() {
            "--json" => as_geojson = true,
            s => return Err(format!("unknown arg: {s}\n\n{}", usage())),
        }
    }

    let view = classify_files(&args[0], &args[1], &args[2])?;
    if as_geojson {
        let levels = view.levels();
        return print_json(&region_collection_to_geojson(view.base(), Some(levels.as_slice())));
    }

    let counts = view.counts();
    println!("regions        {}", view.len());
    println!("no data        {}", counts.no_data);
    println!("below level I  {}", counts.below_level_i);
    println!("level I        {}", counts.level_i);
    println!("level II       {}", counts.level_ii);
    println!("level III      {}", counts.level_iii);
    println!("level IV       {}", counts.level_iv);
    Ok(())
}

fn cmd_popup(args: Vec<String>) -> Result<(), String> {
    // wagemap popup <counties.geojson> <table.json> <salary> <id> [--lottery]
    if args.len() < 4 {
        return Err(usage());
    }
    let mut lottery = false;
    for a in &args[4..] {
        match a.as_str() {
            "--lottery" => lottery = true,
            s => return Err(format!("unknown arg: {s}\n\n{}", usage())),
        }
    }

    let view = classify_files(&args[0], &args[1], &args[2])?;
    let id = &args[3];
    let content = view
        .popup_content(id, lottery, &ChoroplethStyle::default())
        .ok_or_else(|| format!("unknown region {id}"))?;
    print_json(&content)
}

fn cmd_occupation(args: Vec<String>) -> Result<(), String> {
    // wagemap occupation <soc_codes.json> <code>
    if args.len() != 2 {
        return Err(usage());
    }
    let payload = read(Path::new(&args[0]))?;
    let directory = OccupationDirectory::parse(&payload).map_err(|e| e.to_string())?;
    let entry = directory
        .find(&args[1])
        .ok_or_else(|| format!("unknown occupation {}", args[1]))?;
    println!("{}", entry.display());
    println!("table: {}", entry.parent);
    Ok(())
}

fn classify_files(
    counties: &str,
    table: &str,
    salary: &str,
) -> Result<ClassifiedCollection, String> {
    let base = Arc::new(load_counties(Path::new(counties))?);
    let table = parse_wage_table(&read(Path::new(table))?).map_err(|e| format!("{table}: {e}"))?;
    let salary = parse_salary(salary)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "salary is empty".to_string())?;
    classify_all(&Arc::new(table), &base, salary)
        .ok_or_else(|| "salary is not finite".to_string())
}

fn load_counties(path: &Path) -> Result<RegionCollection, String> {
    parse_region_collection(&read(path)?).map_err(|e| format!("{}: {e}", path.display()))
}

fn collection_bounds(collection: &RegionCollection) -> Option<BoundingBox> {
    collection
        .iter()
        .fold(None, |acc, f| merge_bounds(acc, f.bounds()))
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| format!("serialize: {e}"))?;
    println!("{text}");
    Ok(())
}

fn usage() -> String {
    let exe = env::args().next().unwrap_or_else(|| "wagemap".to_string());
    format!(
        "Usage:\n  {exe} states <counties.geojson>\n  {exe} bounds <counties.geojson> [--state AB] [--county ID]\n  {exe} classify <counties.geojson> <table.json> <salary> [--json]\n  {exe} popup <counties.geojson> <table.json> <salary> <id> [--lottery]\n  {exe} occupation <soc_codes.json> <code>\n\nNotes:\n- Salary is annual USD; commas and a leading `$` are accepted.\n- `classify --json` writes the collection as GeoJSON with a `level` property per region.\n"
    )
}
