use std::net::IpAddr;
use std::time::{Duration, Instant};

use dnsstub_proto::message::{RecordData, RecordType, ResourceRecord, ResponseCode};

use crate::query::RawAnswer;
use crate::result::{AddressResult, ServiceResult, TxtResult};

/// What to tell the cache, if anything (spec section 4.5). NODATA and
/// NXDOMAIN are cached differently: NODATA is a "negative positive" entry —
/// an empty list stored in the *positive* cache under the queried
/// `(name, type)` — while NXDOMAIN refutes every type for the name, so it
/// goes in the negative-by-name cache.
pub enum NegativeOutcome {
    Nodata { name: String, rtype: RecordType, expires_at: Instant },
    Nxdomain { name: String, expires_at: Instant },
}

/// Finds a decodable SOA in the authority section and computes
/// `started_at + min(ttl, minimum)` — the RFC 2308 negative-caching TTL.
fn soa_negative_expiry(started_at: Instant, authorities: &[ResourceRecord]) -> Option<Instant> {
    authorities.iter().find_map(|record| match &record.data {
        RecordData::Soa(soa) => {
            let seconds = record.ttl.min(soa.minimum);
            Some(started_at + Duration::from_secs(seconds as u64))
        }
        _ => None,
    })
}

fn has_ns_record(authorities: &[ResourceRecord]) -> bool {
    authorities.iter().any(|r| r.rtype == RecordType::Ns)
}

/// Response-code interpretation (spec section 4.5), run once per query
/// regardless of the typed result being built. Returns a negative-cache
/// instruction when the response refutes the name or the (name, type) pair.
pub fn interpret_response_code(name: &str, rtype: RecordType, response: &RawAnswer) -> Option<NegativeOutcome> {
    match response.response_code {
        ResponseCode::NoError if response.answers.is_empty() => {
            if has_ns_record(&response.authorities) {
                return None;
            }
            soa_negative_expiry(response.started_at, &response.authorities)
                .map(|expires_at| NegativeOutcome::Nodata { name: name.to_string(), rtype, expires_at })
        }
        ResponseCode::NameError => soa_negative_expiry(response.started_at, &response.authorities)
            .map(|expires_at| NegativeOutcome::Nxdomain { name: name.to_string(), expires_at }),
        _ => None,
    }
}

/// Walks the CNAME chain for an A/AAAA query (spec section 4.5). Answers
/// are scanned in order with a "current alias" starting at the queried
/// name; a CNAME hop retargets it, and a matching terminal record is
/// collected. Records whose owner name isn't the current alias are skipped
/// — this is what makes an unrelated record elsewhere in the same section
/// harmless.
pub fn walk_address_chain(query_name: &str, qtype: RecordType, response: &RawAnswer) -> Vec<AddressResult> {
    let mut current_alias = query_name.to_string();
    let mut results = Vec::new();

    for answer in &response.answers {
        if !answer.name.eq_ignore_ascii_case(&current_alias) {
            continue;
        }
        match (&answer.data, answer.rtype) {
            (RecordData::Cname(target), _) => {
                current_alias = target.clone();
            }
            (RecordData::A(addr), t) if t == qtype => {
                results.push(AddressResult {
                    expires_at: response.started_at + Duration::from_secs(answer.ttl as u64),
                    address: IpAddr::V4(*addr),
                });
            }
            (RecordData::Aaaa(addr), t) if t == qtype => {
                results.push(AddressResult {
                    expires_at: response.started_at + Duration::from_secs(answer.ttl as u64),
                    address: IpAddr::V6(*addr),
                });
            }
            _ => {}
        }
    }

    results
}

/// Builds SRV results, stitching in addresses from the additional section
/// (spec section 4.5). Ordering follows the order SRV records appeared in
/// the answer section; RFC 2782 priority/weight selection is left to the
/// caller.
pub fn build_services(response: &RawAnswer) -> Vec<ServiceResult> {
    response
        .answers
        .iter()
        .filter_map(|answer| match &answer.data {
            RecordData::Srv(srv) => {
                let addresses = response
                    .additionals
                    .iter()
                    .filter(|additional| additional.name.eq_ignore_ascii_case(&srv.target))
                    .filter_map(|additional| match additional.data {
                        RecordData::A(addr) => Some(AddressResult {
                            expires_at: response.started_at + Duration::from_secs(additional.ttl as u64),
                            address: IpAddr::V4(addr),
                        }),
                        RecordData::Aaaa(addr) => Some(AddressResult {
                            expires_at: response.started_at + Duration::from_secs(additional.ttl as u64),
                            address: IpAddr::V6(addr),
                        }),
                        _ => None,
                    })
                    .collect();

                Some(ServiceResult {
                    expires_at: response.started_at + Duration::from_secs(answer.ttl as u64),
                    priority: srv.priority,
                    weight: srv.weight,
                    port: srv.port,
                    target: srv.target.clone(),
                    addresses,
                })
            }
            _ => None,
        })
        .collect()
}

/// Builds TXT results (spec section 4.5). The character-string splitting
/// itself lives on [`TxtResult::strings`].
pub fn build_texts(response: &RawAnswer) -> Vec<TxtResult> {
    response
        .answers
        .iter()
        .filter_map(|answer| match &answer.data {
            RecordData::Txt(data) => Some(TxtResult { ttl: answer.ttl, data: data.clone() }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnsstub_proto::message::{RecordClass, SoaData, SrvData};
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn record(name: &str, ttl: u32, data: RecordData) -> ResourceRecord {
        let rtype = match &data {
            RecordData::A(_) => RecordType::A,
            RecordData::Aaaa(_) => RecordType::Aaaa,
            RecordData::Cname(_) => RecordType::Cname,
            RecordData::Ns(_) => RecordType::Ns,
            RecordData::Soa(_) => RecordType::Soa,
            RecordData::Srv(_) => RecordType::Srv,
            RecordData::Txt(_) => RecordType::Txt,
            RecordData::Opaque(_) => RecordType::Other(0),
        };
        ResourceRecord { name: name.to_string(), rtype, rclass: RecordClass::Internet, ttl, data }
    }

    fn response(response_code: ResponseCode, answers: Vec<ResourceRecord>, authorities: Vec<ResourceRecord>, additionals: Vec<ResourceRecord>) -> RawAnswer {
        RawAnswer { started_at: Instant::now(), response_code, answers, authorities, additionals }
    }

    #[test]
    fn resolves_simple_a_record() {
        let resp = response(
            ResponseCode::NoError,
            vec![record("www.example.com", 3600, RecordData::A(Ipv4Addr::new(172, 213, 245, 111)))],
            vec![],
            vec![],
        );
        let results = walk_address_chain("www.example.com", RecordType::A, &resp);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].address, IpAddr::V4(Ipv4Addr::new(172, 213, 245, 111)));
    }

    #[test]
    fn follows_cname_chain_to_terminal_address() {
        let resp = response(
            ResponseCode::NoError,
            vec![
                record("www.example.com", 300, RecordData::Cname("www.example2.com".into())),
                record("www.example2.com", 300, RecordData::Cname("www.example3.com".into())),
                record("www.example3.com", 3600, RecordData::A(Ipv4Addr::new(172, 213, 245, 111))),
            ],
            vec![],
            vec![],
        );
        let results = walk_address_chain("www.example.com", RecordType::A, &resp);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].address, IpAddr::V4(Ipv4Addr::new(172, 213, 245, 111)));
    }

    #[test]
    fn broken_chain_yields_nothing() {
        let resp = response(
            ResponseCode::NoError,
            vec![
                record("www.example.com", 300, RecordData::Cname("www.example2.com".into())),
                record("www.example2.com", 300, RecordData::Cname("www.example3.com".into())),
                record("www.example4.com", 3600, RecordData::A(Ipv4Addr::new(172, 213, 245, 111))),
            ],
            vec![],
            vec![],
        );
        let results = walk_address_chain("www.example.com", RecordType::A, &resp);
        assert!(results.is_empty());
    }

    #[test]
    fn builds_service_result_with_stitched_address() {
        let resp = response(
            ResponseCode::NoError,
            vec![record(
                "_s0._tcp.example.com",
                3600,
                RecordData::Srv(SrvData { priority: 1, weight: 2, port: 8080, target: "www.example.com".into() }),
            )],
            vec![],
            vec![record("www.example.com", 3600, RecordData::A(Ipv4Addr::new(172, 213, 245, 111)))],
        );
        let services = build_services(&resp);
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].priority, 1);
        assert_eq!(services[0].weight, 2);
        assert_eq!(services[0].port, 8080);
        assert_eq!(services[0].target, "www.example.com");
        assert_eq!(services[0].addresses.len(), 1);
        assert_eq!(services[0].addresses[0].address, IpAddr::V4(Ipv4Addr::new(172, 213, 245, 111)));
    }

    #[test]
    fn service_ignores_unrelated_additional_addresses() {
        let resp = response(
            ResponseCode::NoError,
            vec![record(
                "_s0._tcp.example.com",
                3600,
                RecordData::Srv(SrvData { priority: 1, weight: 2, port: 8080, target: "www.example.com".into() }),
            )],
            vec![],
            vec![record("other.example.com", 3600, RecordData::Aaaa(Ipv6Addr::LOCALHOST))],
        );
        assert!(build_services(&resp)[0].addresses.is_empty());
    }

    #[test]
    fn nxdomain_with_soa_produces_negative_outcome() {
        let resp = response(
            ResponseCode::NameError,
            vec![],
            vec![record(
                "example.com",
                300,
                RecordData::Soa(SoaData {
                    mname: "ns1.example.com".into(),
                    rname: "hostmaster.example.com".into(),
                    serial: 1,
                    refresh: 1,
                    retry: 1,
                    expire: 1,
                    minimum: 60,
                }),
            )],
            vec![],
        );
        let outcome = interpret_response_code("missing.example.com", RecordType::A, &resp).unwrap();
        match outcome {
            NegativeOutcome::Nxdomain { name, expires_at } => {
                assert_eq!(name, "missing.example.com");
                assert!(expires_at <= resp.started_at + Duration::from_secs(60));
            }
            NegativeOutcome::Nodata { .. } => panic!("expected Nxdomain outcome"),
        }
    }

    #[test]
    fn nodata_with_ns_record_is_not_cached_negatively() {
        let resp = response(
            ResponseCode::NoError,
            vec![],
            vec![record("example.com", 300, RecordData::Ns("ns1.example.com".into()))],
            vec![],
        );
        assert!(interpret_response_code("example.com", RecordType::A, &resp).is_none());
    }

    #[test]
    fn nodata_without_ns_produces_nodata_outcome() {
        let resp = response(
            ResponseCode::NoError,
            vec![],
            vec![record(
                "example.com",
                300,
                RecordData::Soa(SoaData {
                    mname: "ns1.example.com".into(),
                    rname: "hostmaster.example.com".into(),
                    serial: 1,
                    refresh: 1,
                    retry: 1,
                    expire: 1,
                    minimum: 60,
                }),
            )],
            vec![],
        );
        match interpret_response_code("example.com", RecordType::Txt, &resp).unwrap() {
            NegativeOutcome::Nodata { name, rtype, .. } => {
                assert_eq!(name, "example.com");
                assert_eq!(rtype, RecordType::Txt);
            }
            NegativeOutcome::Nxdomain { .. } => panic!("expected Nodata outcome"),
        }
    }

    #[test]
    fn builds_text_results() {
        let resp = response(
            ResponseCode::NoError,
            vec![record("example.com", 60, RecordData::Txt(vec![5, b'h', b'e', b'l', b'l', b'o']))],
            vec![],
            vec![],
        );
        let texts = build_texts(&resp);
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].strings(), vec![b"hello".as_slice()]);
    }
}
