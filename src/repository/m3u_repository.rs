use crate::model::ChannelEntry;

/// Serializes entries back into M3U+ text, input order preserved,
/// trailing newline included.
pub fn build_m3u_plus(entries: &[ChannelEntry]) -> String {
    let mut out = String::from("#EXTM3U\n");
    for entry in entries {
        out.push_str(&entry.to_m3u());
        out.push('\n');
    }
    out
}
