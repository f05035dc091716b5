use std::net::SocketAddr;
use std::time::Instant;

use dnsstub_proto::message::{Question, RecordClass, ResourceRecord, ResponseCode};

use crate::cancel::Cancellation;
use crate::error::ResolveError;
use crate::transport::{self, BufferPool};

/// Everything the answer processor needs out of a successful exchange
/// (spec section 3: `DnsResponse`).
pub struct RawAnswer {
    pub started_at: Instant,
    pub response_code: ResponseCode,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl RawAnswer {
    /// The message-wide cache expiry (spec section 3): `started_at +
    /// min(ttl)` across every record in the message. `None` when the
    /// message carries no records at all — such a response is never cached.
    pub fn message_wide_expiry(&self) -> Option<Instant> {
        self.answers
            .iter()
            .chain(self.authorities.iter())
            .chain(self.additionals.iter())
            .map(|record| record.ttl)
            .min()
            .map(|ttl| self.started_at + std::time::Duration::from_secs(ttl as u64))
    }
}

/// Drives C3 against each configured server in order until one returns a
/// validated response (spec section 4.4). A question mismatch is terminal
/// for the whole call; every other failure just advances to the next
/// server.
pub async fn execute(
    pool: &BufferPool,
    servers: &[SocketAddr],
    question: &Question,
    cancellation: &Cancellation,
) -> Result<RawAnswer, ResolveError> {
    if cancellation.is_cancelled() {
        return Err(ResolveError::Cancelled);
    }
    if servers.is_empty() {
        return Err(ResolveError::Argument("no servers configured".into()));
    }

    let mut last_error = None;
    // Spec section 7: a non-NoError response code does not raise; if every
    // server returns one, the *last* response (not an error) is what the
    // answer processor interprets — an NXDOMAIN's authority section carries
    // the SOA a negative cache entry needs.
    let mut last_response: Option<RawAnswer> = None;

    for &server in servers {
        let started_at = Instant::now();
        let id: u16 = rand::random();

        let exchange = match transport::udp_exchange(pool.rent_udp(), server, id, question, cancellation).await {
            Ok(exchange) => exchange,
            Err(ResolveError::Cancelled) => return Err(ResolveError::Cancelled),
            Err(ResolveError::Timeout) => return Err(ResolveError::Timeout),
            Err(err) => {
                last_error = Some(err);
                continue;
            }
        };

        let exchange = if exchange.header.flags.is_truncated {
            match transport::tcp_exchange(pool.rent_tcp(), server, id, question, cancellation).await {
                Ok(exchange) => exchange,
                Err(ResolveError::Cancelled) => return Err(ResolveError::Cancelled),
                Err(ResolveError::Timeout) => return Err(ResolveError::Timeout),
                Err(err) => {
                    last_error = Some(err);
                    continue;
                }
            }
        } else {
            exchange
        };

        let mut buf = exchange.buf;
        let header = exchange.header;

        if header.question_count != 1 {
            return Err(ResolveError::Protocol(format!(
                "expected 1 question in response, found {}",
                header.question_count
            )));
        }

        let echoed = Question::read(&mut buf)?;
        if !echoed.name.eq_ignore_ascii_case(&question.name)
            || echoed.qtype != question.qtype
            || !matches!((echoed.qclass, question.qclass), (RecordClass::Internet, RecordClass::Internet))
        {
            return Err(ResolveError::Protocol(format!(
                "echoed question {:?} does not match queried question {:?}",
                echoed, question
            )));
        }

        let answers = read_records(&mut buf, header.answer_count)?;
        let authorities = read_records(&mut buf, header.authority_count)?;
        let additionals = read_records(&mut buf, header.additional_count)?;

        let response = RawAnswer {
            started_at,
            response_code: header.flags.response_code,
            answers,
            authorities,
            additionals,
        };

        if response.response_code == ResponseCode::NoError {
            return Ok(response);
        }

        last_response = Some(response);
    }

    if let Some(response) = last_response {
        return Ok(response);
    }

    Err(last_error.unwrap_or_else(|| {
        ResolveError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "no server returned a usable response",
        ))
    }))
}

fn read_records(
    buf: &mut dnsstub_proto::buffer::PacketBuffer,
    count: u16,
) -> Result<Vec<ResourceRecord>, ResolveError> {
    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        records.push(ResourceRecord::read(buf)?);
    }
    Ok(records)
}
