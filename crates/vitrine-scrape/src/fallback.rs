//! Records substituted when the upstream fails, and the image reference
//! helpers shared with live lookups.

use url::form_urlencoded;
use vitrine_core::record::{ProfileRecord, RecordOrigin};

use crate::handle::Handle;

/// Biography used whenever none is known.
pub const GENERIC_BIOGRAPHY: &str = "Beauty and lifestyle influencer";

/// Follower count reported for unknown handles after an upstream failure.
pub const GENERIC_FOLLOWERS: u64 = 1_000_000;

const PLACEHOLDER_BASE: &str = "https://via.placeholder.com/150/6366f1/ffffff";

/// A demo account whose data is served when the upstream is unavailable.
#[derive(Debug, Clone, Copy)]
pub struct KnownProfile {
  /// Lowercase handle.
  pub handle:    &'static str,
  pub full_name: &'static str,
  /// Original, un-proxied image URL.
  pub image_url: &'static str,
  pub biography: &'static str,
  pub followers: u64,
}

pub const KNOWN_PROFILES: &[KnownProfile] = &[
  KnownProfile {
    handle:    "marimaria",
    full_name: "Mari Maria",
    image_url: "https://instagram.fbfh23-1.fna.fbcdn.net/v/t51.2885-19/499882859_18517038829063592_2049782773428799746_n.jpg",
    biography: "✨Beauty and Makeup✨\n🌟 Founder @marimariamakeup & @marimariahair\n🧡 YT www.youtube.com/MariMaria",
    followers: 21_921_591,
  },
  KnownProfile {
    handle:    "bianca",
    full_name: "BIANCA BOCA ROSA",
    image_url: "https://instagram.fbfh23-1.fna.fbcdn.net/v/t51.2885-19/503612411_18529743355037643_3423264034589024763_n.jpg",
    biography: "COMPRE O STICK COR👇",
    followers: 19_464_929,
  },
  KnownProfile {
    handle:    "brunatavares",
    full_name: "Bruna Bonaldi Tavares - A Bruna de BT 💙",
    image_url: "https://instagram.fbfh23-1.fna.fbcdn.net/v/t51.2885-19/505166717_18511994143059211_8350178056629901334_n.jpg",
    biography: "💄Founder e CEO Bruna Tavares\n🏆Forbes 15 mulheres mais poderosas 2025\n🏆Lista 500 + influentes da América Latina\n💙 BT 👇",
    followers: 3_713_604,
  },
  KnownProfile {
    handle:    "marivmedeiros",
    full_name: "Mari Medeiros Utko",
    image_url: "https://instagram.fbfh23-1.fna.fbcdn.net/v/t51.2885-19/182045419_985913965569154_5686743740812824545_n.jpg",
    biography: "Fotos de plantas e o que mais meu olhar encontrar e registrar.\n@bemmimosa\n@indicefeminino",
    followers: 739,
  },
];

/// Find a known profile by lowercase handle.
pub fn known(key: &str) -> Option<&'static KnownProfile> {
  KNOWN_PROFILES.iter().find(|p| p.handle == key)
}

/// `<proxy_path>?url=<encoded original>`.
pub fn proxied_image_ref(proxy_path: &str, original: &str) -> String {
  let query = form_urlencoded::Serializer::new(String::new())
    .append_pair("url", original)
    .finish();
  format!("{proxy_path}?{query}")
}

/// A generated avatar showing the handle's initial.
pub fn placeholder_image_ref(handle: &Handle) -> String {
  format!("{PLACEHOLDER_BASE}?text={}", handle.initial())
}

/// The degraded answer for `handle`: its known-table entry if there is one,
/// otherwise a generic placeholder record. Never fails.
pub fn fallback_record(handle: &Handle, proxy_path: &str) -> ProfileRecord {
  match known(&handle.key()) {
    Some(p) => ProfileRecord {
      display_name:      p.full_name.to_owned(),
      profile_image_ref: proxied_image_ref(proxy_path, p.image_url),
      biography:         p.biography.to_owned(),
      follower_count:    p.followers,
      origin:            RecordOrigin::KnownFallback,
    },
    None => ProfileRecord {
      display_name:      format!("@{handle}"),
      profile_image_ref: placeholder_image_ref(handle),
      biography:         GENERIC_BIOGRAPHY.to_owned(),
      follower_count:    GENERIC_FOLLOWERS,
      origin:            RecordOrigin::Placeholder,
    },
  }
}

#[cfg(test)]
mod tests {
  use url::Url;

  use super::*;

  const PROXY: &str = "/api/proxy-image";

  fn decode_proxied(image_ref: &str) -> String {
    let url = Url::parse(&format!("http://localhost{image_ref}")).unwrap();
    assert_eq!(url.path(), PROXY);
    url
      .query_pairs()
      .find(|(k, _)| k == "url")
      .map(|(_, v)| v.into_owned())
      .unwrap()
  }

  #[test]
  fn known_handles_match_the_table_case_insensitively() {
    let rec = fallback_record(&Handle::parse("@Bianca").unwrap(), PROXY);
    let entry = known("bianca").unwrap();
    assert_eq!(rec.display_name, entry.full_name);
    assert_eq!(rec.biography, entry.biography);
    assert_eq!(rec.follower_count, entry.followers);
    assert_eq!(rec.origin, RecordOrigin::KnownFallback);
    assert_eq!(decode_proxied(&rec.profile_image_ref), entry.image_url);
  }

  #[test]
  fn unknown_handles_get_the_generic_record() {
    let rec = fallback_record(&Handle::parse("zeca.pagodinho").unwrap(), PROXY);
    assert_eq!(rec.display_name, "@zeca.pagodinho");
    assert_eq!(rec.biography, GENERIC_BIOGRAPHY);
    assert_eq!(rec.follower_count, 1_000_000);
    assert_eq!(rec.origin, RecordOrigin::Placeholder);
    assert!(rec.profile_image_ref.ends_with("?text=Z"));
  }

  #[test]
  fn proxied_ref_escapes_the_original_query() {
    let original = "https://cdn.example.com/p.jpg?stp=dst&_nc_ht=a b";
    let image_ref = proxied_image_ref(PROXY, original);
    assert!(image_ref.starts_with("/api/proxy-image?url=https%3A%2F%2F"));
    assert!(!image_ref.contains("&_nc_ht"));
    assert_eq!(decode_proxied(&image_ref), original);
  }

  #[test]
  fn table_handles_are_lowercase_and_unique() {
    for (i, p) in KNOWN_PROFILES.iter().enumerate() {
      assert_eq!(p.handle, p.handle.to_lowercase());
      assert!(KNOWN_PROFILES[i + 1..].iter().all(|q| q.handle != p.handle));
    }
  }
}
