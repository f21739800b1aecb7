//! Testing utilities and mock implementations.
//!
//! Everything in the core reaches the network through `HttpTransport` and
//! reads configuration through the store traits, so these mocks are enough
//! to exercise every indexer, provider and the manager without real
//! services.
//!
//! # Example
//!
//! ```rust,ignore
//! use streamrelay_core::testing::{fixtures, MockConfigStore, MockProviderFactory, MockSecretStore};
//!
//! let store = Arc::new(MockConfigStore::new());
//! store.set_debrid(vec![fixtures::debrid_config(DebridServiceType::RealDebrid, "rd", 0)]).await;
//!
//! let secrets = Arc::new(MockSecretStore::new());
//! secrets.insert("rd", "token").await;
//!
//! let manager = DebridManager::new(store, secrets, Arc::new(MockProviderFactory::new()));
//! ```

mod mock_debrid;
mod mock_indexer;
mod mock_stores;
mod mock_transport;

pub use mock_debrid::{MockDebridProvider, MockProviderFactory};
pub use mock_indexer::{MockIndexer, MockIndexerFactory};
pub use mock_stores::{MockConfigStore, MockSecretStore};
pub use mock_transport::MockTransport;

/// Test fixtures and helper functions.
///
/// Canned payloads mirror what each upstream API actually returns, trimmed to
/// the fields the clients read plus a few they ignore.
pub mod fixtures {
    use serde_json::json;

    use crate::config::{DebridConfig, DebridServiceType, IndexerConfig, IndexerType};
    use crate::debrid::DebridFile;
    use crate::searcher::RawTorrentResult;

    pub const HASH_A: &str = "0123456789abcdef0123456789abcdef01234567";
    pub const HASH_B: &str = "89abcdef0123456789abcdef0123456789abcdef";
    pub const HASH_C: &str = "fedcba9876543210fedcba9876543210fedcba98";

    /// Create an active indexer config.
    pub fn indexer_config(name: &str, indexer_type: IndexerType) -> IndexerConfig {
        IndexerConfig {
            name: name.to_string(),
            indexer_type,
            base_url: None,
            api_key_ref: None,
            is_active: true,
            priority: 0,
        }
    }

    /// Create an active debrid config.
    pub fn debrid_config(
        service_type: DebridServiceType,
        api_token_ref: &str,
        priority: i32,
    ) -> DebridConfig {
        DebridConfig {
            service_type,
            api_token_ref: api_token_ref.to_string(),
            refresh_token_ref: None,
            is_active: true,
            priority,
        }
    }

    pub fn debrid_file(id: &str, path: &str, size: u64) -> DebridFile {
        DebridFile {
            id: id.to_string(),
            path: path.to_string(),
            size,
        }
    }

    /// Create a raw indexer result with reasonable defaults.
    pub fn raw_result(title: &str, info_hash: &str) -> RawTorrentResult {
        RawTorrentResult {
            title: title.to_string(),
            info_hash: info_hash.to_string(),
            size_bytes: 4 * 1024 * 1024 * 1024, // 4 GB
            seeders: 50,
            leechers: 10,
            published_at: None,
        }
    }

    // =========================================================================
    // Indexers
    // =========================================================================

    /// Two items: one with a `torznab:attr` infohash, one with only a magnet.
    pub const TORZNAB_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:torznab="http://torznab.com/schemas/2015/feed">
  <channel>
    <title>Jackett</title>
    <description>Jackett indexer feed</description>
    <item>
      <title>Dune.Part.Two.2024.2160p.WEB-DL.DDP5.1.Atmos.DV.HDR10.H.265</title>
      <guid>http://jackett.local/details/1</guid>
      <link>http://jackett.local/dl/1.torrent</link>
      <size>21474836480</size>
      <pubDate>Fri, 01 Mar 2024 12:00:00 +0000</pubDate>
      <category>2000</category>
      <enclosure url="http://jackett.local/dl/1.torrent" length="21474836480" type="application/x-bittorrent" />
      <torznab:attr name="category" value="2040" />
      <torznab:attr name="seeders" value="120" />
      <torznab:attr name="peers" value="150" />
      <torznab:attr name="infohash" value="0123456789abcdef0123456789abcdef01234567" />
    </item>
    <item>
      <title><![CDATA[Dune.Part.Two.2024.1080p.BluRay.x264-GROUP]]></title>
      <guid>http://jackett.local/details/2</guid>
      <size>10737418240</size>
      <torznab:attr name="seeders" value="80" />
      <torznab:attr name="peers" value="95" />
      <torznab:attr name="magneturl" value="magnet:?xt=urn:btih:89ABCDEF0123456789ABCDEF0123456789ABCDEF&amp;dn=Dune.Part.Two" />
    </item>
  </channel>
</rss>"#;

    /// Three rows: hash field, magnet only, and no hash source at all.
    pub const PROWLARR_RESULTS: &str = r#"[
  {
    "guid": "https://tracker.example/details/100",
    "indexerId": 1,
    "indexer": "TrackerOne",
    "title": "The.Office.US.S09E01.1080p.WEB-DL.DDP5.1.H.264",
    "size": 1500000000,
    "publishDate": "2024-01-15T10:00:00Z",
    "infoHash": "0123456789ABCDEF0123456789ABCDEF01234567",
    "seeders": 42,
    "leechers": 3,
    "protocol": "torrent"
  },
  {
    "guid": "https://tracker.example/details/101",
    "indexerId": 2,
    "indexer": "TrackerTwo",
    "title": "The.Office.US.S09E01.720p.HDTV.x264",
    "size": "734003200",
    "magnetUrl": "magnet:?xt=urn:btih:fedcba9876543210fedcba9876543210fedcba98&dn=The.Office",
    "seeders": 7,
    "leechers": 1,
    "protocol": "torrent"
  },
  {
    "guid": "https://tracker.example/details/102",
    "indexerId": 2,
    "indexer": "TrackerTwo",
    "title": "The.Office.US.S09E01.480p",
    "size": 200000000,
    "seeders": 1,
    "protocol": "torrent"
  }
]"#;

    pub const YTS_RESPONSE: &str = r#"{
  "status": "ok",
  "status_message": "Query was successful",
  "data": {
    "movie_count": 1,
    "limit": 50,
    "page_number": 1,
    "movies": [
      {
        "id": 36361,
        "title": "Dune",
        "title_long": "Dune (2021)",
        "year": 2021,
        "imdb_code": "tt1160419",
        "torrents": [
          {
            "hash": "0123456789ABCDEF0123456789ABCDEF01234567",
            "quality": "2160p",
            "type": "bluray",
            "video_codec": "x265",
            "seeds": 310,
            "peers": 25,
            "size_bytes": 13958643712,
            "date_uploaded_unix": 1640000000
          },
          {
            "hash": "89ABCDEF0123456789ABCDEF0123456789ABCDEF",
            "quality": "1080p",
            "type": "web",
            "video_codec": "x264",
            "seeds": 540,
            "peers": 40,
            "size_bytes": 2254857830,
            "date_uploaded_unix": 1635000000
          }
        ]
      }
    ]
  }
}"#;

    pub const EZTV_RESPONSE: &str = r#"{
  "imdb_id": "0386676",
  "torrents_count": 2,
  "limit": 100,
  "page": 1,
  "torrents": [
    {
      "id": 1,
      "hash": "0123456789abcdef0123456789abcdef01234567",
      "filename": "The.Office.US.S09E01.720p.HDTV.x264-KILLERS[eztv].mkv",
      "title": "The Office US S09E01 720p HDTV x264-KILLERS EZTV",
      "season": "9",
      "episode": "1",
      "seeds": 50,
      "peers": 5,
      "date_released_unix": 1600000000,
      "size_bytes": "367001600"
    },
    {
      "id": 2,
      "hash": "89abcdef0123456789abcdef0123456789abcdef",
      "filename": "The.Office.US.S09E02.720p.HDTV.x264-KILLERS[eztv].mkv",
      "title": "The Office US S09E02 720p HDTV x264-KILLERS EZTV",
      "season": "9",
      "episode": "2",
      "seeds": 44,
      "peers": 6,
      "date_released_unix": 1600600000,
      "size_bytes": "368050176"
    }
  ]
}"#;

    /// Every field is a string, and the hash is uppercase.
    pub const APIBAY_RESULTS: &str = r#"[
  {
    "id": "71234567",
    "name": "Dune Part Two 2024 1080p WEBRip x265",
    "info_hash": "0123456789ABCDEF0123456789ABCDEF01234567",
    "leechers": "80",
    "seeders": "1500",
    "num_files": "1",
    "size": "8589934592",
    "username": "uploader",
    "added": "1710000000",
    "status": "vip",
    "category": "207",
    "imdb": "tt15239678"
  }
]"#;

    pub const APIBAY_NO_RESULTS: &str = r#"[
  {
    "id": "0",
    "name": "No results returned",
    "info_hash": "0000000000000000000000000000000000000000",
    "leechers": "0",
    "seeders": "0",
    "num_files": "0",
    "size": "0",
    "username": "",
    "added": "0",
    "status": "member",
    "category": "0",
    "imdb": ""
  }
]"#;

    // =========================================================================
    // Real-Debrid
    // =========================================================================

    /// `HASH_A` cached (keyed uppercase), `HASH_B` not.
    pub fn rd_instant_availability() -> String {
        json!({
            HASH_A.to_uppercase(): {
                "rd": [{
                    "1": {"filename": "Dune.Part.Two.2024.2160p.mkv", "filesize": 21474836480u64},
                    "2": {"filename": "Sample.mkv", "filesize": 52428800u64}
                }]
            },
            HASH_B: []
        })
        .to_string()
    }

    pub fn rd_torrent_list() -> String {
        json!([
            {"id": "RDOTHER", "filename": "Other", "hash": HASH_C, "bytes": 1, "status": "downloaded"},
            {"id": "RDEXISTING", "filename": "Dune", "hash": HASH_A, "bytes": 21474836480u64, "status": "downloaded"}
        ])
        .to_string()
    }

    pub fn rd_torrent_info(status: &str) -> String {
        json!({
            "id": "RD1",
            "filename": "Dune.Part.Two.2024.2160p.WEB-DL.DV.HDR10.H.265",
            "hash": HASH_A,
            "bytes": 21500000000u64,
            "status": status,
            "files": [
                {"id": 1, "path": "/Dune.Part.Two.2024.2160p.WEB-DL.DV.HDR10.H.265.mkv", "bytes": 21474836480u64, "selected": 1},
                {"id": 2, "path": "/Sample/sample.mkv", "bytes": 52428800u64, "selected": 0},
                {"id": 3, "path": "/Dune.Part.Two.2024.srt", "bytes": 90000, "selected": 0}
            ],
            "links": ["https://real-debrid.com/d/ABCDEF"]
        })
        .to_string()
    }

    pub fn rd_user() -> String {
        json!({
            "id": 1001,
            "username": "relayuser",
            "email": "relay@example.com",
            "points": 1000,
            "type": "premium",
            "expiration": "2027-01-01T00:00:00.000Z"
        })
        .to_string()
    }

    // =========================================================================
    // AllDebrid
    // =========================================================================

    pub fn ad_instant() -> String {
        json!({
            "status": "success",
            "data": {
                "magnets": [
                    {"magnet": HASH_A, "hash": HASH_A, "instant": true},
                    {"magnet": HASH_B, "hash": HASH_B, "instant": false}
                ]
            }
        })
        .to_string()
    }

    pub fn ad_magnet_list() -> String {
        json!({
            "status": "success",
            "data": {
                "magnets": [
                    {"id": 554, "filename": "Other", "hash": HASH_B, "status": "Downloading", "statusCode": 1},
                    {"id": 555, "filename": "Dune", "hash": HASH_A, "status": "Ready", "statusCode": 4}
                ]
            }
        })
        .to_string()
    }

    pub fn ad_magnet_ready() -> String {
        json!({
            "status": "success",
            "data": {
                "magnets": {
                    "id": 555,
                    "filename": "Dune",
                    "hash": HASH_A,
                    "status": "Ready",
                    "statusCode": 4,
                    "links": [
                        {"link": "https://alldebrid.com/f/SAMPLE", "filename": "Dune.Part.Two.2024.Sample.mkv", "size": 50000000u64},
                        {"link": "https://alldebrid.com/f/MAIN", "filename": "Dune.Part.Two.2024.2160p.WEB-DL.mkv", "size": 4000000000u64},
                        {"link": "https://alldebrid.com/f/NFO", "filename": "Dune.nfo", "size": 2000}
                    ]
                }
            }
        })
        .to_string()
    }

    // =========================================================================
    // Premiumize
    // =========================================================================

    pub fn pm_cache_check() -> String {
        json!({
            "status": "success",
            "response": [true, false],
            "transcoded": [true, false],
            "filename": ["Dune.Part.Two.2024.2160p.mkv", null],
            "filesize": ["21474836480", null]
        })
        .to_string()
    }

    pub fn pm_transfer_list() -> String {
        json!({
            "status": "success",
            "transfers": [
                {
                    "id": "pm-done",
                    "name": "Dune.Part.Two.2024.2160p",
                    "status": "finished",
                    "progress": 1,
                    "src": format!("magnet:?xt=urn:btih:{}&dn=Dune", HASH_A)
                },
                {
                    "id": "pm-running",
                    "name": "Other",
                    "status": "running",
                    "progress": 0.4,
                    "src": format!("magnet:?xt=urn:btih:{}", HASH_B)
                }
            ]
        })
        .to_string()
    }

    pub fn pm_directdl() -> String {
        json!({
            "status": "success",
            "location": "https://dl.premiumize.me/folder",
            "filename": "Dune.Part.Two.2024.2160p",
            "filesize": 21525164032u64,
            "content": [
                {
                    "path": "Dune.Part.Two.2024.2160p.mkv",
                    "size": 21474836480u64,
                    "link": "https://dl.premiumize.me/main.mkv",
                    "stream_link": "https://stream.premiumize.me/main.mkv"
                },
                {
                    "path": "Sample/sample.mkv",
                    "size": 50327552,
                    "link": "https://dl.premiumize.me/sample.mkv",
                    "stream_link": null
                }
            ]
        })
        .to_string()
    }

    // =========================================================================
    // TorBox
    // =========================================================================

    pub fn tb_checkcached() -> String {
        json!({
            "success": true,
            "error": null,
            "detail": "Found cached torrents.",
            "data": {
                HASH_A: {"name": "Dune.Part.Two.2024.1080p", "size": 10737418240u64, "hash": HASH_A}
            }
        })
        .to_string()
    }

    pub fn tb_mylist() -> String {
        json!({
            "success": true,
            "error": null,
            "detail": "Torrent list retrieved.",
            "data": [
                {"id": 41, "hash": HASH_B, "name": "Other", "download_finished": false, "download_state": "downloading"},
                {"id": 42, "hash": HASH_A, "name": "Dune", "download_finished": true, "download_state": "cached"}
            ]
        })
        .to_string()
    }

    pub fn tb_torrent(finished: bool) -> String {
        json!({
            "success": true,
            "error": null,
            "detail": "Torrent retrieved.",
            "data": {
                "id": 42,
                "hash": HASH_A,
                "name": "Dune.Part.Two.2024.1080p.BluRay.x264",
                "download_finished": finished,
                "download_state": if finished { "cached" } else { "downloading" },
                "files": [
                    {"id": 0, "name": "Dune/Sample/sample.mkv", "size": 40000000},
                    {"id": 1, "name": "Dune/Dune.Part.Two.2024.1080p.BluRay.x264.mkv", "size": 10737418240u64},
                    {"id": 2, "name": "Dune/Dune.Part.Two.2024.1080p.BluRay.x264.srt", "size": 120000}
                ]
            }
        })
        .to_string()
    }

    // =========================================================================
    // Easynews
    // =========================================================================

    pub fn easynews_search() -> String {
        json!({
            "data": [
                {
                    "0": "abc123def",
                    "10": "Dune.Part.Two.2024.1080p.WEB-DL",
                    "11": ".mkv",
                    "rawSize": 2147483648u64,
                    "runtime": 9960
                }
            ],
            "dlFarm": "auto",
            "dlPort": 443,
            "results": 1,
            "page": 1
        })
        .to_string()
    }
}
