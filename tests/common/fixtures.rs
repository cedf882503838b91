//! Dataset fixtures and a mocked GitHub contents API

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use covid_cases::CaseType;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Upstream directory of the time series
pub const SUBPATH: &str = "csse_covid_19_data/csse_covid_19_time_series";

/// Confirmed cases: Australia split in two states, Canada with a state lacking coordinates
pub const CONFIRMED_CSV: &str = "\
Province/State,Country/Region,Lat,Long,3/28/20,3/29/20,3/30/20
New South Wales,Australia,-33.8688,151.2093,1617,1791,1918
Victoria,Australia,-37.8136,144.9631,685,769,821
,Italy,43.0,12.0,92472,97689,101739
Grand Princess,Canada,,,13,13,13
Ontario,Canada,51.2538,-85.3232,993,1355,1706
,Chad,15.4542,18.7322,5,5,5
";

/// Deaths, same rows and dates as confirmed
pub const DEAD_CSV: &str = "\
Province/State,Country/Region,Lat,Long,3/28/20,3/29/20,3/30/20
New South Wales,Australia,-33.8688,151.2093,7,8,8
Victoria,Australia,-37.8136,144.9631,3,4,4
,Italy,43.0,12.0,10023,10779,11591
Grand Princess,Canada,,,0,0,0
Ontario,Canada,51.2538,-85.3232,18,21,23
,Chad,15.4542,18.7322,0,0,0
";

/// Recoveries, Canada reported as a single country row
pub const RECOVERED_CSV: &str = "\
Province/State,Country/Region,Lat,Long,3/28/20,3/29/20,3/30/20
New South Wales,Australia,-33.8688,151.2093,4,4,4
Victoria,Australia,-37.8136,144.9631,70,70,70
,Italy,43.0,12.0,12384,13030,14620
,Canada,56.1304,-106.3468,184,185,466
,Chad,15.4542,18.7322,0,0,2
";

/// Fixture content of a dataset
pub fn csv(case: CaseType) -> &'static str {
    match case {
        CaseType::Confirmed => CONFIRMED_CSV,
        CaseType::Dead => DEAD_CSV,
        CaseType::Recovered => RECOVERED_CSV,
    }
}

/// URL path of a dataset on the contents API
pub fn contents_path(case: CaseType) -> String {
    format!(
        "/repos/CSSEGISandData/COVID-19/contents/{}/{}",
        SUBPATH,
        case.file_name()
    )
}

/// Contents API body for `text`, base64-wrapped every 60 columns like GitHub does
pub fn contents_body(case: CaseType, text: &str) -> serde_json::Value {
    let encoded = STANDARD.encode(text);
    let wrapped: Vec<String> = encoded
        .as_bytes()
        .chunks(60)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect();
    serde_json::json!({
        "type": "file",
        "name": case.file_name(),
        "path": format!("{}/{}", SUBPATH, case.file_name()),
        "sha": format!("{:040x}", case as u8),
        "size": text.len(),
        "encoding": "base64",
        "content": wrapped.join("\n"),
    })
}

/// Serve `text` for `case` after `delay`
pub async fn mount_dataset(server: &MockServer, case: CaseType, text: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(contents_path(case)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", format!("\"{}\"", case.file_name()))
                .insert_header("X-RateLimit-Remaining", "57")
                .set_body_json(contents_body(case, text))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Serve all three fixture datasets without delay
pub async fn mount_all(server: &MockServer) {
    for case in CaseType::ALL {
        mount_dataset(server, case, csv(case), Duration::ZERO).await;
    }
}
